//! 字节大小解析
//! 支持 K/M/G 后缀（1024 进制），与基准程序的参数约定一致

use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// 解析大小字符串，返回字节数
///
/// `"4G"` → 4294967296，`"128K"` → 131072，`"16"` → 16。
pub fn parse_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let Some(last) = text.chars().last() else {
        return Err(AppError::Config("empty size string".into()));
    };

    let (digits, multiplier) = match last {
        'K' | 'k' => (&text[..text.len() - 1], KIB),
        'M' | 'm' => (&text[..text.len() - 1], MIB),
        'G' | 'g' => (&text[..text.len() - 1], GIB),
        _ => (text, 1),
    };

    let value: u64 = digits
        .parse()
        .map_err(|e| AppError::Config(format!("invalid size {text:?}: {e}")))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| AppError::Config(format!("size {text:?} overflows u64")))
}

/// 以字节为单位的大小
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        parse_size(s).map(Self)
    }
}

/// 输出最大的整除后缀，例如 4294967296 → "4G"
impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes != 0 && bytes % GIB == 0 {
            write!(f, "{}G", bytes / GIB)
        } else if bytes != 0 && bytes % MIB == 0 {
            write!(f, "{}M", bytes / MIB)
        } else if bytes != 0 && bytes % KIB == 0 {
            write!(f, "{}K", bytes / KIB)
        } else {
            write!(f, "{bytes}")
        }
    }
}
