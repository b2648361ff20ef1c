//! 测试集文件读写
//! 每行一个十进制地址，无表头，每次运行覆盖

use crate::error::{AppError, Result};
use compio::fs::File;
use compio::io::AsyncWriteAtExt;
use std::fmt::Write as _;
use std::path::Path;

/// 将地址序列渲染为测试集文本
pub fn render_test_set(sequence: &[u64]) -> String {
    // 平均每个地址不超过 8 个字符
    let mut out = String::with_capacity(sequence.len() * 8);
    for addr in sequence {
        // 写入 String 不会失败
        let _ = writeln!(out, "{addr}");
    }
    out
}

/// 解析测试集文本
pub fn parse_test_set(text: &str) -> Result<Vec<u64>> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| {
            line.trim().parse::<u64>().map_err(|e| {
                AppError::TestSet(format!("line {}: invalid address {line:?}: {e}", idx + 1))
            })
        })
        .collect()
}

/// 覆盖写入测试集文件
///
/// 返回前会 `sync_all` 并关闭文件，外部基准程序随后读取时能看到完整内容。
pub async fn write_test_set(sequence: &[u64], path: &Path) -> Result<()> {
    let buf = render_test_set(sequence).into_bytes();
    let bytes = buf.len();

    let mut file = File::create(path)
        .await
        .map_err(|e| AppError::io(path, e))?;
    if bytes > 0 {
        file.write_all_at(buf, 0)
            .await
            .0
            .map_err(|e| AppError::io(path, e))?;
    }
    file.sync_all().await.map_err(|e| AppError::io(path, e))?;
    file.close().await.map_err(|e| AppError::io(path, e))?;

    tracing::debug!(path = %path.display(), addresses = sequence.len(), bytes, "wrote test set");
    Ok(())
}

/// 读取测试集文件
pub async fn read_test_set(path: &Path) -> Result<Vec<u64>> {
    let bytes = compio::fs::read(path)
        .await
        .map_err(|e| AppError::io(path, e))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| AppError::TestSet(format!("{} is not UTF-8: {e}", path.display())))?;
    parse_test_set(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_address_per_line() {
        assert_eq!(render_test_set(&[3, 0, 17]), "3\n0\n17\n");
        assert_eq!(render_test_set(&[]), "");
    }

    #[test]
    fn parse_reports_line_number() {
        let err = parse_test_set("1\n2\nx\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
        assert_eq!(parse_test_set("").unwrap(), Vec::<u64>::new());
    }

    #[compio::test]
    async fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testset.txt");
        let sequence = vec![5, 1, 4, 0, 2, 3, 1_000_000];

        write_test_set(&sequence, &path).await.unwrap();
        assert_eq!(read_test_set(&path).await.unwrap(), sequence);
    }

    #[compio::test]
    async fn overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testset.txt");

        write_test_set(&[10, 20, 30, 40], &path).await.unwrap();
        write_test_set(&[7], &path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "7\n");
    }

    #[compio::test]
    async fn empty_sequence_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testset.txt");

        write_test_set(&[], &path).await.unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[compio::test]
    async fn unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("testset.txt");

        let err = write_test_set(&[1], &path).await.unwrap_err();
        assert!(matches!(err, AppError::Io { .. }), "{err}");
    }
}
