//! 访问模式生成模块
//! 为多实例 FTL 生成逻辑块地址序列
//!
//! 所有生成器都是 `cnt`（每实例 I/O 数）、配置和显式种子的纯函数；
//! 相同输入总是得到相同序列。

use crate::config::BenchmarkConfig;
use crate::error::{AppError, Result};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;

/// 访问策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// 顺序访问
    Linear,
    /// 全局随机打乱
    Random,
    /// 按块在实例间轮转
    RoundRobin,
    /// 按整页在实例间轮转
    RoundRobinPerPage,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Linear,
        Strategy::Random,
        Strategy::RoundRobin,
        Strategy::RoundRobinPerPage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Linear => "linear",
            Strategy::Random => "random",
            Strategy::RoundRobin => "round-robin",
            Strategy::RoundRobinPerPage => "round-robin-per-page",
        }
    }

    /// 是否依赖页内块布局（要求块大小整除页大小）
    pub fn is_page_aware(self) -> bool {
        matches!(self, Strategy::RoundRobin | Strategy::RoundRobinPerPage)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Config(format!("unknown strategy {s:?}")))
    }
}

/// 地址序列生成器
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    instance_count: u64,
    /// 块大小不整除页大小时为 None，此时页相关策略不可用
    blocks_per_page: Option<u64>,
    block_size: String,
    page_size: u64,
    seed: u64,
}

impl PatternGenerator {
    /// 创建新的生成器；全局配置错误在此处报告
    pub fn new(config: &BenchmarkConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            instance_count: config.instance_count,
            blocks_per_page: config.blocks_per_page().ok(),
            block_size: config.block_size.to_string(),
            page_size: config.page_size,
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 检查某个策略在当前配置下是否可用，不生成任何地址
    pub fn check(&self, strategy: Strategy, cnt: u64) -> Result<()> {
        self.sequence_len(cnt)?;
        if strategy.is_page_aware() {
            self.bpp()?;
        }
        Ok(())
    }

    /// 按策略生成地址序列
    pub fn generate(&self, strategy: Strategy, cnt: u64) -> Result<Vec<u64>> {
        self.check(strategy, cnt)?;
        let sequence = match strategy {
            Strategy::Linear => self.linear(cnt)?,
            Strategy::Random => self.random(cnt)?,
            Strategy::RoundRobin => self.round_robin(cnt)?,
            Strategy::RoundRobinPerPage => self.round_robin_per_page(cnt)?,
        };
        tracing::debug!(%strategy, cnt, len = sequence.len(), "generated address sequence");
        Ok(sequence)
    }

    /// `[0, cnt * instances)` 递增序列
    pub fn linear(&self, cnt: u64) -> Result<Vec<u64>> {
        self.sequence_len(cnt)?;
        Ok((0..cnt * self.instance_count).collect())
    }

    /// 与 linear 相同的地址集合，均匀随机打乱
    pub fn random(&self, cnt: u64) -> Result<Vec<u64>> {
        let mut sequence = self.linear(cnt)?;
        sequence.shuffle(&mut self.rng());
        Ok(sequence)
    }

    /// 每个实例独立打乱自己的块，然后按实例轮转输出
    pub fn round_robin(&self, cnt: u64) -> Result<Vec<u64>> {
        let len = self.sequence_len(cnt)?;
        let bpp = self.bpp()?;
        let gap = bpp * self.instance_count;

        let mut rng = self.rng();
        let lanes: Vec<Vec<u64>> = (0..self.instance_count)
            .map(|j| {
                let mut lane: Vec<u64> = (0..cnt)
                    .map(|i| i % bpp + gap * (i / bpp) + j * bpp)
                    .collect();
                lane.shuffle(&mut rng);
                lane
            })
            .collect();

        let mut sequence = Vec::with_capacity(len);
        for i in 0..lanes.first().map_or(0, Vec::len) {
            sequence.extend(lanes.iter().map(|lane| lane[i]));
        }
        Ok(sequence)
    }

    /// 页粒度的轮转：实例 j 拥有页 `p * instances + j`，
    /// 页顺序在实例内打乱，每页展开为连续的块地址。
    ///
    /// `cnt` 不是 bpp 的整数倍时，每个实例最后一页只包含 `cnt % bpp` 个块，
    /// 因此地址集合与 [`round_robin`](Self::round_robin) 完全一致。
    pub fn round_robin_per_page(&self, cnt: u64) -> Result<Vec<u64>> {
        let len = self.sequence_len(cnt)?;
        let bpp = self.bpp()?;
        let pages = cnt.div_ceil(bpp);
        let tail = cnt % bpp;
        let instances = self.instance_count;

        let mut rng = self.rng();
        let lanes: Vec<Vec<(u64, u64)>> = (0..instances)
            .map(|j| {
                let mut lane: Vec<(u64, u64)> = (0..pages)
                    .map(|p| {
                        let blocks = if p + 1 == pages && tail != 0 { tail } else { bpp };
                        (p * instances + j, blocks)
                    })
                    .collect();
                lane.shuffle(&mut rng);
                lane
            })
            .collect();

        let mut sequence = Vec::with_capacity(len);
        for p in 0..lanes.first().map_or(0, Vec::len) {
            for lane in &lanes {
                let (page, blocks) = lane[p];
                let first = page * bpp;
                sequence.extend(first..first + blocks);
            }
        }
        Ok(sequence)
    }

    fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    fn bpp(&self) -> Result<u64> {
        self.blocks_per_page.ok_or_else(|| {
            AppError::Config(format!(
                "block size {} does not evenly divide page size {}",
                self.block_size, self.page_size
            ))
        })
    }

    fn sequence_len(&self, cnt: u64) -> Result<usize> {
        cnt.checked_mul(self.instance_count)
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "{cnt} I/Os per instance across {} instances does not fit in memory",
                    self.instance_count
                ))
            })
    }
}
