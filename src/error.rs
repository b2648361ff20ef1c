//! 错误处理模块
//! 定义了所有应用级别的错误类型

use std::io;
use std::path::PathBuf;

/// 应用主错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 配置错误（在任何文件写入或进程启动之前报告）
    #[error("Configuration error: {0}")]
    Config(String),

    /// 测试集文件读写错误
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 测试集文件内容格式错误
    #[error("Test set error: {0}")]
    TestSet(String),

    /// 无法获得管理员权限
    #[error("Privilege elevation unavailable: {0}")]
    Privilege(String),

    /// 基准程序无法启动
    #[error("Failed to launch harness {program}: {source}")]
    HarnessLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// 基准程序以非零状态退出
    #[error("Harness exited with {}", describe_exit(.code))]
    HarnessFailed { code: Option<i32> },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 配置类错误在生成序列之前就会出现
    pub fn is_config(&self) -> bool {
        matches!(self, AppError::Config(_))
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 错误上下文扩展trait
pub trait ErrorContext<T> {
    /// 添加上下文信息
    fn with_context(self, context: &str) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn with_context(self, context: &str) -> Result<T> {
        self.map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{context}: {msg}")),
            AppError::TestSet(msg) => AppError::TestSet(format!("{context}: {msg}")),
            AppError::Privilege(msg) => AppError::Privilege(format!("{context}: {msg}")),
            other => other,
        })
    }
}
