//! 探索の進捗の通知

use std::time::Duration;

use log::info;

use super::info::SearchInfo;
use super::node::Pv;
use crate::types::{DEPTH_ONE_PLY, Score};

/// 読み筋の更新の通知内容
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress<'a> {
    pub pv: &'a Pv,
    pub elapsed: Duration,
    /// DEPTH_ONE_PLY単位
    pub depth: i32,
    pub score: Score,
    pub info: &'a SearchInfo,
}

/// 探索の進捗を受け取る
///
/// すべて既定では何もしない。
pub trait SearchHandler {
    fn on_start(&mut self) {}

    /// ルートで最善手か評価値が更新された
    fn on_update_pv(&mut self, _progress: &SearchProgress<'_>) {}

    /// aspiration windowの下限を下回った
    fn on_fail_low(&mut self, _progress: &SearchProgress<'_>) {}

    /// aspiration windowの上限を上回った
    fn on_fail_high(&mut self, _progress: &SearchProgress<'_>) {}

    /// 反復深化の1回が終わった
    fn on_iterate_end(&mut self, _elapsed: Duration, _depth: i32) {}
}

/// 何もしないハンドラ
#[derive(Debug, Default)]
pub struct NullSearchHandler;

impl SearchHandler for NullSearchHandler {}

/// 読み筋をログに出すハンドラ
#[derive(Debug, Default)]
pub struct LoggingSearchHandler;

impl LoggingSearchHandler {
    fn log(progress: &SearchProgress<'_>, suffix: &str) {
        info!(
            "{:2}: {:10}: {:7} {}: {}{}",
            progress.depth / DEPTH_ONE_PLY,
            progress.info.total_nodes(),
            progress.elapsed.as_millis(),
            progress.pv,
            progress.score,
            suffix
        );
    }
}

impl SearchHandler for LoggingSearchHandler {
    fn on_update_pv(&mut self, progress: &SearchProgress<'_>) {
        Self::log(progress, "");
    }

    fn on_fail_low(&mut self, progress: &SearchProgress<'_>) {
        Self::log(progress, " (fail-low)");
    }

    fn on_fail_high(&mut self, progress: &SearchProgress<'_>) {
        Self::log(progress, " (fail-high)");
    }
}
