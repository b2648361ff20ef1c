//! 命令行参数

use crate::config::{self, BenchmarkConfig, Elevation, FailurePolicy, IoEngine};
use crate::runner::{RunPlan, Step};
use crate::size::ByteSize;
use clap::Parser;
use std::path::PathBuf;

/// 生成 FTL 访问序列并运行外部块设备基准程序
#[derive(Parser, Debug)]
#[command(name = "ftlbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 运行步骤，格式为 STRATEGY:BLOCK_SIZE，可重复
    ///
    /// 策略：linear, random, round-robin, round-robin-per-page。
    /// 未指定时依次运行 linear:4K 到 linear:128K。
    #[arg(short = 's', long = "step", value_name = "STRATEGY:BS")]
    pub steps: Vec<Step>,

    /// FTL 实例数量
    #[arg(short = 'n', long, default_value_t = config::FTL_INSTANCES)]
    pub instances: u64,

    /// 物理页大小（字节，2 的幂）
    #[arg(long, default_value_t = config::PAGE_SIZE)]
    pub page_size: u64,

    /// 总传输大小，支持 K/M/G 后缀
    #[arg(short = 't', long, default_value_t = config::TOTAL_SIZE)]
    pub total_size: ByteSize,

    /// 目标块设备
    #[arg(short = 'f', long, default_value = config::DEVICE_FILE)]
    pub device: PathBuf,

    /// I/O 引擎
    #[arg(short = 'm', long, value_enum, default_value_t = IoEngine::Libaio)]
    pub engine: IoEngine,

    /// 并行任务数
    #[arg(short = 'j', long, default_value_t = config::NUM_JOBS)]
    pub jobs: u32,

    /// 队列深度
    #[arg(short = 'q', long, default_value_t = config::IO_DEPTH)]
    pub queue_depth: u32,

    /// 预编译的基准程序路径
    #[arg(long, default_value = config::HARNESS_PATH)]
    pub harness: PathBuf,

    /// 测试集文件路径
    #[arg(long, default_value = config::TEST_SET_FILE)]
    pub test_set: PathBuf,

    /// 不使用 sudo 直接启动基准程序（已经是 root 时）
    #[arg(long)]
    pub no_sudo: bool,

    /// 随机种子；未指定时随机生成并记录在日志中
    #[arg(long)]
    pub seed: Option<u64>,

    /// 基准程序失败后的处理策略
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_failure: FailurePolicy,

    /// 只生成并写入测试集，不启动基准程序
    #[arg(long)]
    pub dry_run: bool,

    /// 输出详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            instance_count: self.instances,
            page_size: self.page_size,
            total_size: self.total_size,
            device_file: self.device.clone(),
            io_engine: self.engine,
            job_count: self.jobs,
            queue_depth: self.queue_depth,
            harness_path: self.harness.clone(),
            test_set_path: self.test_set.clone(),
            elevation: if self.no_sudo {
                Elevation::None
            } else {
                Elevation::Sudo
            },
            seed: self.seed,
            on_failure: self.on_failure,
            ..BenchmarkConfig::default()
        }
    }

    pub fn plan(&self) -> RunPlan {
        if self.steps.is_empty() {
            RunPlan::default()
        } else {
            RunPlan::new(self.steps.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Strategy;

    #[test]
    fn defaults_match_reference_setup() {
        let cli = Cli::try_parse_from(["ftlbench"]).unwrap();
        let config = cli.config();
        assert_eq!(config.instance_count, 4);
        assert_eq!(config.total_size.to_string(), "4G");
        assert_eq!(config.elevation, Elevation::Sudo);
        assert_eq!(cli.plan(), RunPlan::default());
    }

    #[test]
    fn parses_steps_and_overrides() {
        let cli = Cli::try_parse_from([
            "ftlbench",
            "--step",
            "round-robin:16K",
            "-s",
            "random:4k",
            "--engine",
            "io_uring",
            "--total-size",
            "1G",
            "--no-sudo",
            "--seed",
            "7",
            "--on-failure",
            "generate-only",
        ])
        .unwrap();

        let plan = cli.plan();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].strategy, Strategy::RoundRobin);
        assert_eq!(plan.steps[1].block_size, ByteSize::new(4096));

        let config = cli.config();
        assert_eq!(config.io_engine, IoEngine::IoUring);
        assert_eq!(config.total_size.bytes(), 1 << 30);
        assert_eq!(config.elevation, Elevation::None);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.on_failure, FailurePolicy::GenerateOnly);
    }

    #[test]
    fn rejects_malformed_step() {
        assert!(Cli::try_parse_from(["ftlbench", "--step", "linear"]).is_err());
    }
}
