//! 运行编排
//! 按计划顺序执行：计算 cnt → 生成序列 → 写入测试集 → 调用基准程序

use crate::config::{BenchmarkConfig, DEFAULT_PLAN_BLOCK_SIZES, FailurePolicy, messages};
use crate::error::{AppError, ErrorContext, Result};
use crate::harness::{HarnessCommand, HarnessRunner};
use crate::pattern::{PatternGenerator, Strategy};
use crate::size::ByteSize;
use crate::testset::write_test_set;
use std::fmt;
use std::str::FromStr;

/// 计划中的单个步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub strategy: Strategy,
    pub block_size: ByteSize,
}

impl Step {
    pub fn new(strategy: Strategy, block_size: ByteSize) -> Self {
        Self {
            strategy,
            block_size,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy, self.block_size)
    }
}

/// 解析 `策略:块大小`，例如 `round-robin:16K`
impl FromStr for Step {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (strategy, block_size) = s
            .split_once(':')
            .ok_or_else(|| AppError::Config(format!("step {s:?} must be STRATEGY:BLOCK_SIZE")))?;
        Ok(Self::new(strategy.parse()?, block_size.parse()?))
    }
}

/// 有序的运行计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub steps: Vec<Step>,
}

impl Default for RunPlan {
    /// 顺序访问，块大小从 4K 到 128K
    fn default() -> Self {
        Self {
            steps: DEFAULT_PLAN_BLOCK_SIZES
                .into_iter()
                .map(|bytes| Step::new(Strategy::Linear, ByteSize::new(bytes)))
                .collect(),
        }
    }
}

impl RunPlan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

/// 单个步骤的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// 基准程序成功退出
    Completed,
    /// 只生成并写入了测试集
    Generated,
    /// 基准程序失败
    HarnessFailed(Option<i32>),
    /// 由于之前的失败，未调用基准程序
    HarnessSkipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    /// 每实例 I/O 数
    pub cnt: u64,
    pub addresses: usize,
    pub outcome: StepOutcome,
}

/// 整次运行的报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub seed: u64,
    pub steps: Vec<StepReport>,
    /// 在 `FailurePolicy::Abort` 下因基准程序失败提前结束
    pub aborted: bool,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::HarnessFailed(_)))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// 运行编排器
pub struct Orchestrator<R> {
    config: BenchmarkConfig,
    runner: R,
    seed: u64,
    dry_run: bool,
}

impl<R: HarnessRunner> Orchestrator<R> {
    /// 未指定种子时在这里随机生成，生成器内部从不使用隐式随机源
    pub fn new(config: BenchmarkConfig, runner: R) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            runner,
            seed,
            dry_run: false,
        }
    }

    /// 只生成和写入测试集，不调用基准程序
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// 在任何文件写入前校验整个计划
    pub fn validate(&self, plan: &RunPlan) -> Result<()> {
        self.config.validate()?;
        for (idx, step) in plan.steps.iter().enumerate() {
            self.prepare(step)
                .map(|_| ())
                .with_context(&format!("step {} ({step})", idx + 1))?;
        }
        Ok(())
    }

    fn prepare(&self, step: &Step) -> Result<(PatternGenerator, u64)> {
        let config = self.config.with_block_size(step.block_size);
        let generator = PatternGenerator::new(&config, self.seed)?;
        let cnt = config.per_instance_count()?;
        generator.check(step.strategy, cnt)?;
        Ok((generator, cnt))
    }

    /// 顺序执行计划中的每个步骤
    pub async fn run(&mut self, plan: &RunPlan) -> Result<RunReport> {
        self.validate(plan)
            .with_context(messages::PLAN_VALIDATION_FAILED)?;

        tracing::info!(
            steps = plan.steps.len(),
            seed = self.seed,
            test_set = %self.config.test_set_path.display(),
            "starting benchmark run"
        );

        // 提权失败时不写入任何测试集
        if !self.dry_run {
            if let Some(step) = plan.steps.first() {
                let command = HarnessCommand::new(&self.config, step.block_size);
                if let Err(e) = self.runner.ensure_privilege(&command).await {
                    tracing::error!(error = %e, "{}", messages::HARNESS_RUN_FAILED);
                    return Err(e);
                }
            }
        }

        let mut report = RunReport {
            seed: self.seed,
            steps: Vec::with_capacity(plan.steps.len()),
            aborted: false,
        };
        let mut harness_blocked = false;

        for step in &plan.steps {
            let (generator, cnt) = self.prepare(step)?;
            let sequence = generator.generate(step.strategy, cnt)?;
            tracing::info!(%step, cnt, addresses = sequence.len(), "generated test set");

            // 写入失败时绝不调用基准程序
            if let Err(e) = write_test_set(&sequence, &self.config.test_set_path).await {
                tracing::error!(%step, error = %e, "{}", messages::TEST_SET_WRITE_FAILED);
                return Err(e);
            }

            let outcome = if self.dry_run {
                StepOutcome::Generated
            } else if harness_blocked {
                tracing::info!(%step, "skipping harness after earlier failure");
                StepOutcome::HarnessSkipped
            } else {
                let command = HarnessCommand::new(&self.config, step.block_size);
                tracing::info!(%step, %command, "running harness");
                match self.runner.run(&command).await.and_then(|exit| exit.into_result()) {
                    Ok(()) => StepOutcome::Completed,
                    Err(AppError::HarnessFailed { code }) => {
                        match self.config.on_failure {
                            FailurePolicy::Abort => report.aborted = true,
                            FailurePolicy::GenerateOnly => harness_blocked = true,
                            FailurePolicy::Continue => {}
                        }
                        tracing::warn!(
                            %step,
                            ?code,
                            policy = ?self.config.on_failure,
                            "{}",
                            messages::HARNESS_RUN_FAILED
                        );
                        StepOutcome::HarnessFailed(code)
                    }
                    // 无法启动或无法提权时后续步骤同样会失败
                    Err(e) => {
                        tracing::error!(%step, error = %e, "{}", messages::HARNESS_RUN_FAILED);
                        return Err(e);
                    }
                }
            };

            report.steps.push(StepReport {
                step: *step,
                cnt,
                addresses: sequence.len(),
                outcome,
            });
            if report.aborted {
                break;
            }
        }

        tracing::info!(
            steps = report.steps.len(),
            failures = report.failures(),
            aborted = report.aborted,
            "benchmark run finished"
        );
        Ok(report)
    }
}
