//! 外部基准程序调用
//! 参数以独立的 argv 传递，不经过 shell

use crate::config::{BenchmarkConfig, Elevation};
use crate::error::{AppError, Result};
use crate::size::ByteSize;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

const SUDO: &str = "sudo";
/// 不等待密码输入，无法提权时立即失败
const SUDO_NON_INTERACTIVE: &str = "-n";

/// 一次基准程序调用的完整描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessCommand {
    /// 实际执行的程序（提权时为 sudo）
    pub program: OsString,
    pub args: Vec<OsString>,
    /// 基准程序本身的路径
    pub harness: PathBuf,
    /// 工作目录：测试集文件所在目录
    pub current_dir: Option<PathBuf>,
    pub elevation: Elevation,
}

impl HarnessCommand {
    /// 按配置构建命令行：`-f 设备 -m 引擎 -j 任务数 -q 队列深度 -t 总大小 -b 块大小`
    ///
    /// 子进程的工作目录会切换到测试集所在目录，因此相对的基准程序路径
    /// 在这里先按当前目录解析为绝对路径。
    pub fn new(config: &BenchmarkConfig, block_size: ByteSize) -> Self {
        let harness = std::path::absolute(&config.harness_path)
            .unwrap_or_else(|_| config.harness_path.clone());

        let mut args: Vec<OsString> = Vec::with_capacity(14);
        let program = match config.elevation {
            Elevation::Sudo => {
                args.push(SUDO_NON_INTERACTIVE.into());
                args.push(harness.clone().into_os_string());
                OsString::from(SUDO)
            }
            Elevation::None => harness.clone().into_os_string(),
        };

        args.push("-f".into());
        args.push(config.device_file.clone().into_os_string());
        args.push("-m".into());
        args.push(config.io_engine.as_str().into());
        args.push("-j".into());
        args.push(config.job_count.to_string().into());
        args.push("-q".into());
        args.push(config.queue_depth.to_string().into());
        args.push("-t".into());
        args.push(config.total_size.to_string().into());
        args.push("-b".into());
        args.push(block_size.to_string().into());

        let current_dir = config
            .test_set_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);

        Self {
            program,
            args,
            harness,
            current_dir,
            elevation: config.elevation,
        }
    }

    /// 将启动失败映射为具体错误：sudo 不可用视为提权失败
    pub fn launch_error(&self, source: io::Error) -> AppError {
        let sudo_unavailable = matches!(
            source.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
        );
        if self.elevation == Elevation::Sudo && sudo_unavailable {
            AppError::Privilege(format!(
                "cannot run {SUDO} to access the raw device ({source}); \
                 run as root with --no-sudo or install sudo"
            ))
        } else {
            AppError::HarnessLaunch {
                program: self.harness.display().to_string(),
                source,
            }
        }
    }
}

impl fmt::Display for HarnessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// 基准程序退出状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessExit {
    /// 被信号终止时为 None
    pub code: Option<i32>,
}

impl HarnessExit {
    pub const SUCCESS: HarnessExit = HarnessExit { code: Some(0) };

    #[inline]
    pub fn success(self) -> bool {
        self.code == Some(0)
    }

    /// 非零退出转换为错误
    pub fn into_result(self) -> Result<()> {
        if self.success() {
            Ok(())
        } else {
            Err(AppError::HarnessFailed { code: self.code })
        }
    }

    /// `sudo -n true` 的退出状态转换为提权结果
    pub fn into_privilege_result(self) -> Result<()> {
        if self.success() {
            return Ok(());
        }
        let status = self
            .code
            .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
        Err(AppError::Privilege(format!(
            "{SUDO} {SUDO_NON_INTERACTIVE} refused elevation ({status}); \
             run `sudo -v` first or run as root with --no-sudo"
        )))
    }
}

/// 进程边界，测试中可替换为记录调用的实现
#[allow(async_fn_in_trait)]
pub trait HarnessRunner {
    /// 确认能以所需权限启动基准程序，在第一次写入测试集前调用
    async fn ensure_privilege(&mut self, command: &HarnessCommand) -> Result<()> {
        let _ = command;
        Ok(())
    }

    /// 运行基准程序直到退出；不解析其输出
    async fn run(&mut self, command: &HarnessCommand) -> Result<HarnessExit>;
}

/// 通过 compio 启动真实进程
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl HarnessRunner for ProcessRunner {
    async fn ensure_privilege(&mut self, command: &HarnessCommand) -> Result<()> {
        if command.elevation != Elevation::Sudo {
            return Ok(());
        }

        let status = compio::process::Command::new(SUDO)
            .args([SUDO_NON_INTERACTIVE, "true"])
            .status()
            .await
            .map_err(|e| command.launch_error(e))?;
        HarnessExit {
            code: status.code(),
        }
        .into_privilege_result()
    }

    async fn run(&mut self, command: &HarnessCommand) -> Result<HarnessExit> {
        // sudo 会自行报告找不到程序，这里提前给出明确错误
        if !command.harness.is_file() {
            return Err(AppError::HarnessLaunch {
                program: command.harness.display().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "harness executable not found"),
            });
        }

        tracing::debug!(%command, "launching harness");
        let mut process = compio::process::Command::new(&command.program);
        process.args(&command.args);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let status = process
            .status()
            .await
            .map_err(|e| command.launch_error(e))?;
        Ok(HarnessExit {
            code: status.code(),
        })
    }
}
