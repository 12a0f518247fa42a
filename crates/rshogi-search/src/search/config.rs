//! 探索設定

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shek::ShekTable;
use crate::tt::DEFAULT_SIZE_MB;
use crate::types::MAX_PLY;

/// 探索設定の検証エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tt_size_mb must be positive")]
    ZeroTtSize,
    #[error("shek_size_log2 must be in {min}..={max}, got {value}")]
    ShekSize { value: u32, min: u32, max: u32 },
    #[error("max_depth must be in 1..={max}, got {value}")]
    MaxDepth { value: i32, max: i32 },
    #[error("optimum_time_ms ({optimum}) exceeds maximum_time_ms ({maximum})")]
    OptimumExceedsMaximum { optimum: u64, maximum: u64 },
}

/// 探索設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 目安の思考時間（ミリ秒）
    pub optimum_time_ms: u64,
    /// 最大の思考時間（ミリ秒、Noneなら無制限）
    pub maximum_time_ms: Option<u64>,
    /// 反復深化の最大の深さ（手数）
    pub max_depth: i32,
    /// 置換表のサイズ（MB）
    pub tt_size_mb: usize,
    /// SHEK表のバケット数（log2）
    pub shek_size_log2: u32,
    /// 最初の反復の前にルートの指し手をシャッフルする
    pub random_root: bool,
    /// シャッフルの乱数シード
    pub seed: u64,
}

impl SearchConfig {
    pub const DEFAULT_OPTIMUM_TIME_MS: u64 = 3 * 1000;
    pub const DEFAULT_MAXIMUM_TIME_MS: u64 = 3 * 1000;
    pub const DEFAULT_MAX_DEPTH: i32 = 32;

    /// SHEK表の最大サイズ（log2）
    pub const MAX_SHEK_SIZE_LOG2: u32 = 24;

    /// 時間制限なしの設定
    pub fn infinite() -> Self {
        SearchConfig { maximum_time_ms: None, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tt_size_mb == 0 {
            return Err(ConfigError::ZeroTtSize);
        }
        let (min, max) = (ShekTable::MIN_BITS, Self::MAX_SHEK_SIZE_LOG2);
        if !(min..=max).contains(&self.shek_size_log2) {
            return Err(ConfigError::ShekSize { value: self.shek_size_log2, min, max });
        }
        let max_ply = MAX_PLY as i32;
        if !(1..=max_ply).contains(&self.max_depth) {
            return Err(ConfigError::MaxDepth { value: self.max_depth, max: max_ply });
        }
        if let Some(maximum) = self.maximum_time_ms
            && self.optimum_time_ms > maximum
        {
            return Err(ConfigError::OptimumExceedsMaximum {
                optimum: self.optimum_time_ms,
                maximum,
            });
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            optimum_time_ms: Self::DEFAULT_OPTIMUM_TIME_MS,
            maximum_time_ms: Some(Self::DEFAULT_MAXIMUM_TIME_MS),
            max_depth: Self::DEFAULT_MAX_DEPTH,
            tt_size_mb: DEFAULT_SIZE_MB,
            shek_size_log2: ShekTable::DEFAULT_BITS,
            random_root: false,
            seed: 0,
        }
    }
}
