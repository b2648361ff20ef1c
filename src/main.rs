//! ftlbench - 生成 FTL 访问序列并驱动外部块设备基准程序

use anyhow::{Context, Result, bail};
use clap::Parser;
use ftl_bench::cli::Cli;
use ftl_bench::config::messages;
use ftl_bench::harness::ProcessRunner;
use ftl_bench::runner::{Orchestrator, StepOutcome};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    // RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    let plan = cli.plan();

    let runtime = compio::runtime::Runtime::new().context(messages::RUNTIME_CREATE_FAILED)?;
    let mut orchestrator = Orchestrator::new(config, ProcessRunner).dry_run(cli.dry_run);
    let seed = orchestrator.seed();

    let report = runtime
        .block_on(orchestrator.run(&plan))
        .with_context(|| format!("benchmark run failed (seed {seed})"))?;

    println!("seed: {}", report.seed);
    for step in &report.steps {
        let outcome = match step.outcome {
            StepOutcome::Completed => "ok".to_string(),
            StepOutcome::Generated => "generated".to_string(),
            StepOutcome::HarnessSkipped => "skipped".to_string(),
            StepOutcome::HarnessFailed(Some(code)) => format!("failed (status {code})"),
            StepOutcome::HarnessFailed(None) => "failed (signal)".to_string(),
        };
        println!(
            "{:<28} cnt={:<10} addresses={:<10} {}",
            step.step.to_string(),
            step.cnt,
            step.addresses,
            outcome
        );
    }

    if report.aborted {
        bail!(
            "aborted after step {} of {}: harness failed",
            report.steps.len(),
            plan.steps.len()
        );
    }
    if !report.is_success() {
        bail!("{} of {} steps failed", report.failures(), report.steps.len());
    }
    Ok(())
}
