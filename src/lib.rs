//! FTL 基准测试驱动库
//!
//! 为多实例 FTL 目标生成逻辑块访问序列，写入测试集文件，
//! 并调用外部编译好的基准程序对裸块设备执行 I/O。
//!
//! 特性：
//! - 顺序、随机、按块轮转、按页轮转四种访问模式
//! - 显式种子，序列可复现
//! - 使用Compio异步运行时写文件和启动进程
//! - 可配置的失败处理策略

pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod pattern;
pub mod runner;
pub mod size;
pub mod testset;
