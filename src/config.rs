//! 配置模块
//! 定义默认常量以及基准测试的运行配置

use crate::error::{AppError, Result};
use crate::size::ByteSize;
use std::fmt;
use std::path::PathBuf;

/// FTL 实例数量
pub const FTL_INSTANCES: u64 = 4;

/// 物理页大小（字节）
pub const PAGE_SIZE: u64 = 32 * 1024;

/// 目标块设备
pub const DEVICE_FILE: &str = "/dev/nvme2n1";

/// 并行任务数
pub const NUM_JOBS: u32 = 4;

/// 队列深度
pub const IO_DEPTH: u32 = 16;

/// 总传输大小
pub const TOTAL_SIZE: ByteSize = ByteSize::new(4 * 1024 * 1024 * 1024);

/// 默认块大小
pub const BLOCK_SIZE: ByteSize = ByteSize::new(128 * 1024);

/// 测试集文件名
pub const TEST_SET_FILE: &str = "testset.txt";

/// 预编译的基准程序
pub const HARNESS_PATH: &str = "./test";

/// 默认运行计划中依次测试的块大小
pub const DEFAULT_PLAN_BLOCK_SIZES: [u64; 6] = [
    4 * 1024,
    8 * 1024,
    16 * 1024,
    32 * 1024,
    64 * 1024,
    128 * 1024,
];

/// 错误消息常量
pub mod messages {
    pub const RUNTIME_CREATE_FAILED: &str = "Failed to create Compio runtime";
    pub const PLAN_VALIDATION_FAILED: &str = "Run plan validation failed";
    pub const TEST_SET_WRITE_FAILED: &str = "Failed to write test set";
    pub const HARNESS_RUN_FAILED: &str = "Harness run failed";
}

/// I/O 引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum IoEngine {
    #[default]
    #[value(name = "libaio")]
    Libaio,
    #[value(name = "io_uring")]
    IoUring,
}

impl IoEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            IoEngine::Libaio => "libaio",
            IoEngine::IoUring => "io_uring",
        }
    }
}

impl fmt::Display for IoEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提权方式：裸块设备需要管理员权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Elevation {
    /// 通过 sudo 启动基准程序
    #[default]
    Sudo,
    /// 直接启动（已经是 root）
    None,
}

/// 基准程序失败后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// 立即停止整个运行
    #[default]
    Abort,
    /// 继续生成并写入后续测试集，但不再启动基准程序
    GenerateOnly,
    /// 继续启动后续的基准程序
    Continue,
}

/// 基准测试配置
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    pub instance_count: u64,
    pub page_size: u64,
    pub block_size: ByteSize,
    pub total_size: ByteSize,
    pub device_file: PathBuf,
    pub io_engine: IoEngine,
    pub job_count: u32,
    pub queue_depth: u32,
    pub harness_path: PathBuf,
    pub test_set_path: PathBuf,
    pub elevation: Elevation,
    /// 随机种子；为空时由编排层随机生成
    pub seed: Option<u64>,
    pub on_failure: FailurePolicy,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            instance_count: FTL_INSTANCES,
            page_size: PAGE_SIZE,
            block_size: BLOCK_SIZE,
            total_size: TOTAL_SIZE,
            device_file: PathBuf::from(DEVICE_FILE),
            io_engine: IoEngine::default(),
            job_count: NUM_JOBS,
            queue_depth: IO_DEPTH,
            harness_path: PathBuf::from(HARNESS_PATH),
            test_set_path: PathBuf::from(TEST_SET_FILE),
            elevation: Elevation::default(),
            seed: None,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl BenchmarkConfig {
    /// 校验与策略无关的全局约束
    pub fn validate(&self) -> Result<()> {
        if self.instance_count == 0 {
            return Err(AppError::Config("instance count must be positive".into()));
        }
        if !self.page_size.is_power_of_two() {
            return Err(AppError::Config(format!(
                "page size {} is not a positive power of two",
                self.page_size
            )));
        }
        if self.block_size.bytes() == 0 {
            return Err(AppError::Config("block size must be positive".into()));
        }
        if self.job_count == 0 {
            return Err(AppError::Config("job count must be positive".into()));
        }
        if self.queue_depth == 0 {
            return Err(AppError::Config("queue depth must be positive".into()));
        }
        Ok(())
    }

    /// 返回替换了块大小的配置副本
    pub fn with_block_size(&self, block_size: ByteSize) -> Self {
        Self {
            block_size,
            ..self.clone()
        }
    }

    /// 每个实例的 I/O 数量（向下取整，余数被丢弃）
    pub fn per_instance_count(&self) -> Result<u64> {
        self.validate()?;
        Ok(self.total_size.bytes() / self.block_size.bytes() / self.instance_count)
    }

    /// 每页包含的块数；块大小必须整除页大小
    pub fn blocks_per_page(&self) -> Result<u64> {
        self.validate()?;
        let block = self.block_size.bytes();
        if self.page_size % block != 0 {
            return Err(AppError::Config(format!(
                "block size {} does not evenly divide page size {}",
                self.block_size, self.page_size
            )));
        }
        Ok(self.page_size / block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_setup() {
        let config = BenchmarkConfig::default();
        assert!(config.validate().is_ok());
        // 4G / 128K / 4
        assert_eq!(config.per_instance_count().unwrap(), 8192);
    }

    #[test]
    fn per_instance_count_truncates() {
        let config = BenchmarkConfig {
            instance_count: 3,
            total_size: ByteSize::new(100),
            block_size: ByteSize::new(8),
            ..BenchmarkConfig::default()
        };
        // 100 / 8 = 12, 12 / 3 = 4
        assert_eq!(config.per_instance_count().unwrap(), 4);
    }

    #[test]
    fn rejects_zero_instances() {
        let config = BenchmarkConfig {
            instance_count: 0,
            ..BenchmarkConfig::default()
        };
        assert!(config.per_instance_count().unwrap_err().is_config());
    }

    #[test]
    fn rejects_non_power_of_two_page() {
        let config = BenchmarkConfig {
            page_size: 3000,
            ..BenchmarkConfig::default()
        };
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn blocks_per_page_requires_divisor() {
        let config = BenchmarkConfig::default().with_block_size(ByteSize::new(16 * 1024));
        assert_eq!(config.blocks_per_page().unwrap(), 2);

        // 128K 大于 32K 页
        let config = BenchmarkConfig::default();
        assert!(config.blocks_per_page().unwrap_err().is_config());

        let config = BenchmarkConfig::default().with_block_size(ByteSize::new(3 * 1024));
        assert!(config.blocks_per_page().unwrap_err().is_config());
    }

    #[test]
    fn engine_names() {
        assert_eq!(IoEngine::Libaio.to_string(), "libaio");
        assert_eq!(IoEngine::IoUring.to_string(), "io_uring");
    }
}
