//! 時間管理
//!
//! - `TimeManager`: 直近3回の反復の評価値と読み筋の安定度から、
//!   目安の時間を基準に打ち切りを判断する
//! - `Timer`: 最大の思考時間に達したら中断フラグを立てるスレッド

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use log::info;

use super::node::Pv;
use crate::types::{DEPTH_ONE_PLY, Score};

/// 最大の思考時間に対してこの割合（%）を使ったら打ち切る
const MAXIMUM_USAGE_PERCENT: u64 = 80;

/// 目安の時間に対する打ち切り条件
struct Tier {
    /// 経過時間（目安の時間に対する%）
    elapsed_percent: u64,
    /// 最小の深さ（手数）
    min_depth_plies: i32,
    /// 前回の反復からの評価値の変化の範囲（排他的）
    score_diff: (i32, i32),
    /// 前回・前々回の読み筋と一致している手数
    stability: (usize, usize),
}

const TIERS: [Tier; 6] = [
    Tier { elapsed_percent: 10, min_depth_plies: 25, score_diff: (-16, 32), stability: (14, 15) },
    Tier { elapsed_percent: 20, min_depth_plies: 23, score_diff: (-32, 64), stability: (12, 13) },
    Tier { elapsed_percent: 70, min_depth_plies: 18, score_diff: (-64, 256), stability: (4, 5) },
    Tier { elapsed_percent: 100, min_depth_plies: 18, score_diff: (-128, 512), stability: (3, 3) },
    Tier { elapsed_percent: 200, min_depth_plies: 18, score_diff: (-256, 1024), stability: (2, 2) },
    Tier { elapsed_percent: 400, min_depth_plies: 18, score_diff: (-512, 2048), stability: (1, 1) },
];

/// 1回の反復の結果
#[derive(Clone, Default)]
struct Iteration {
    /// 0なら未記録
    depth: i32,
    score: Score,
    pv: Pv,
}

/// 時間管理
pub struct TimeManager {
    optimum_ms: Option<u64>,
    maximum_ms: Option<u64>,
    previous2: Iteration,
    previous: Iteration,
    current: Iteration,
    should_interrupt: bool,
}

impl TimeManager {
    pub fn new() -> Self {
        TimeManager {
            optimum_ms: None,
            maximum_ms: None,
            previous2: Iteration::default(),
            previous: Iteration::default(),
            current: Iteration::default(),
            should_interrupt: false,
        }
    }

    /// 探索の開始時に呼ぶ（Noneは無制限）
    pub fn reset(&mut self, optimum_ms: Option<u64>, maximum_ms: Option<u64>) {
        self.optimum_ms = optimum_ms;
        self.maximum_ms = maximum_ms;
        self.should_interrupt = false;
        self.previous2.depth = 0;
        self.previous.depth = 0;
        self.current.depth = 0;
    }

    #[inline]
    pub fn should_interrupt(&self) -> bool {
        self.should_interrupt
    }

    /// ルートの指し手を1つ読み終えるたびに呼ぶ
    pub fn update(&mut self, elapsed_ms: u64, depth: i32, score: Score, pv: &Pv) {
        if self.current.depth != 0 && self.current.depth != depth {
            self.previous2 = std::mem::take(&mut self.previous);
            self.previous = self.current.clone();
        }
        self.current.depth = depth;
        self.current.score = score;
        self.current.pv.clone_from(pv);

        if let Some(maximum) = self.maximum_ms
            && elapsed_ms * 100 >= maximum * MAXIMUM_USAGE_PERCENT
        {
            self.should_interrupt = true;
            info!("TimeManager: interrupt ({MAXIMUM_USAGE_PERCENT}% of maximum)");
            return;
        }

        if self.previous2.depth == 0 || self.previous.depth == 0 {
            return;
        }
        let Some(optimum) = self.optimum_ms else {
            return;
        };

        let score_diff = (self.current.score - self.previous.score).raw();
        let stability = self.current.pv.common_prefix_len(&self.previous.pv);
        let stability2 = self.current.pv.common_prefix_len(&self.previous2.pv);

        for tier in &TIERS {
            if elapsed_ms * 100 >= optimum * tier.elapsed_percent
                && depth >= DEPTH_ONE_PLY * tier.min_depth_plies
                && score_diff > tier.score_diff.0
                && score_diff < tier.score_diff.1
                && (stability >= tier.stability.0 || stability2 >= tier.stability.1)
            {
                self.should_interrupt = true;
                info!("TimeManager: interrupt ({}% of optimum)", tier.elapsed_percent);
                return;
            }
        }
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 最大の思考時間で中断フラグを立てるタイマー
///
/// dropすると待機中のスレッドを止めて合流する。
pub struct Timer {
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn start(limit: Duration, interrupted: Arc<AtomicBool>) -> Self {
        let (cancel, rx) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(limit) {
                interrupted.store(true, Ordering::Relaxed);
                info!("Timer: maximum time reached");
            }
        });
        Timer { cancel: Some(cancel), handle: Some(handle) }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        // 送信側を閉じるとrecv_timeoutがDisconnectedで戻る
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
