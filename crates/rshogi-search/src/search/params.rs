//! 探索パラメータ
//!
//! 深さはすべて `DEPTH_ONE_PLY` 単位（1手 = 8）。

use std::sync::LazyLock;

use super::history::History;
use crate::types::{DEPTH_ONE_PLY, Score};

// =============================================================================
// 反復深化・aspiration window
// =============================================================================

/// 反復深化の最初の深さ
pub const FIRST_DEPTH: i32 = DEPTH_ONE_PLY * 3 / 2;

/// 反復深化の1回あたりの増分
pub const DEPTH_STEP: i32 = DEPTH_ONE_PLY;

/// aspiration windowの幅（最後の段は無制限）
pub const ASP_WINDOWS: [i32; 2] = [128, 512];

/// aspiration windowを使い始める深さ
pub const ASP_MIN_DEPTH: i32 = DEPTH_ONE_PLY * 6;

// =============================================================================
// 延長
// =============================================================================

/// 王手
pub const EXT_CHECK: i32 = DEPTH_ONE_PLY;

/// 王手に対する応手が1つしかない
pub const EXT_ONE_REPLY: i32 = DEPTH_ONE_PLY / 2;

/// 直前に取られた升での取り返し（経路上で1回だけ）
pub const EXT_RECAPTURE: i32 = DEPTH_ONE_PLY / 4;

// =============================================================================
// Null Move Pruning
// =============================================================================

/// 残り深さに掛ける割合（/16）
pub const NULL_DEPTH_RATE: i32 = 11;

/// 残り深さから引く量
pub const NULL_DEPTH_REDUCE: i32 = DEPTH_ONE_PLY * 3 / 2;

/// 静的評価がbetaを上回る分に応じて深さを減らすときの割合
pub const NULL_DEPTH_VRATE: i32 = 200;

/// null moveの後に読む深さ
#[inline]
pub fn null_depth(depth: i32, stand_pat: Score, beta: Score) -> i32 {
    let bonus = (DEPTH_ONE_PLY * (stand_pat - beta).raw() / NULL_DEPTH_VRATE).max(0);
    depth * NULL_DEPTH_RATE / 16 - NULL_DEPTH_REDUCE - bonus
}

// =============================================================================
// Recursive Iterative Deepening
// =============================================================================

/// ハッシュの指し手がないときに浅い探索で指し手を得る最小の深さ
pub const RECURSIVE_ID_MIN_DEPTH: i32 = DEPTH_ONE_PLY * 3;

/// 浅い探索の深さ
#[inline]
pub fn recursive_id_depth(depth: i32) -> i32 {
    if depth < DEPTH_ONE_PLY * 4 { DEPTH_ONE_PLY } else { depth - DEPTH_ONE_PLY * 3 }
}

// =============================================================================
// 枝刈り
// =============================================================================

/// futility pruningを行う最大の深さ（この深さ未満）
pub const FUT_MAX_DEPTH: i32 = DEPTH_ONE_PLY * 7;

/// 静止探索のfutility margin
pub const QUIES_FUT_MARGIN: i32 = 120;

/// SEEが負の手を読まない深さ（この深さ未満）
pub const SEE_PRUNING_DEPTH: i32 = DEPTH_ONE_PLY * 2;

/// 静止探索で小さな駒取りを読まなくなる深さ
pub const QUIES_EXCLUDE_SMALL_DEPTH: i32 = -DEPTH_ONE_PLY * 6;

/// ノードスタックの末尾の余裕（このplyに達したら静的評価を返す）
pub const PLY_MARGIN: usize = 2;

// =============================================================================
// テーブル
// =============================================================================

/// futility margin表の手数の上限
pub const FUT_MOVE_COUNT_MAX: usize = 64;

/// LMR表の大きさ
const LMR_TABLE_SIZE: usize = 64;

const FUT_DEPTH_NUM: usize = (FUT_MAX_DEPTH / DEPTH_ONE_PLY) as usize;

type FutilityMargins = [[i32; FUT_MOVE_COUNT_MAX]; FUT_DEPTH_NUM];

/// futility margin（深さ[ply] × 手数）
static FUTILITY_MARGINS: LazyLock<FutilityMargins> = LazyLock::new(|| {
    let mut table: FutilityMargins = [[0; FUT_MOVE_COUNT_MAX]; FUT_DEPTH_NUM];
    for (d, row) in table.iter_mut().enumerate() {
        for (mc, value) in row.iter_mut().enumerate() {
            *value = 180 + 120 * d as i32 - 2 * mc as i32;
        }
    }
    table
});

type Reductions = [[i32; LMR_TABLE_SIZE]; LMR_TABLE_SIZE];

/// LMRの減らす深さ（深さ[ply] × 手数、DEPTH_ONE_PLY単位）
static REDUCTIONS: LazyLock<Reductions> = LazyLock::new(|| {
    let mut table: Reductions = [[0; LMR_TABLE_SIZE]; LMR_TABLE_SIZE];
    for (d, row) in table.iter_mut().enumerate().skip(1) {
        for (mc, value) in row.iter_mut().enumerate().skip(1) {
            let r = 0.5 * (d as f64).ln() * (mc as f64).ln();
            *value = (r * DEPTH_ONE_PLY as f64) as i32;
        }
    }
    table
});

/// futility margin
#[inline]
pub fn futility_margin(depth: i32, move_count: usize) -> i32 {
    debug_assert!(depth < FUT_MAX_DEPTH);
    let d = (depth.max(0) / DEPTH_ONE_PLY) as usize;
    FUTILITY_MARGINS[d][move_count.min(FUT_MOVE_COUNT_MAX - 1)]
}

/// LMRで減らす深さ
///
/// - `history_ratio`: 指し手の成功率（0..=History::RATIO_MAX）。高いほど減らさない
/// - `pv_node`: 窓が開いている（null windowでない）
/// - `improving`: 2手前より静的評価が上がっている
#[inline]
pub fn reduction(
    depth: i32,
    move_count: usize,
    history_ratio: i32,
    pv_node: bool,
    improving: bool,
) -> i32 {
    if depth <= 0 || move_count == 0 {
        return 0;
    }
    let d = ((depth / DEPTH_ONE_PLY) as usize).min(LMR_TABLE_SIZE - 1);
    let mc = move_count.min(LMR_TABLE_SIZE - 1);
    let mut r = REDUCTIONS[d][mc];
    if !improving {
        r += DEPTH_ONE_PLY / 2;
    }
    if pv_node {
        r = r * 2 / 3;
    }
    // 成功率が高い手ほど減らさない
    r -= r * history_ratio / History::RATIO_MAX / 2;
    r.max(0) / (DEPTH_ONE_PLY / 2) * (DEPTH_ONE_PLY / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_bounds() {
        assert_eq!(reduction(0, 10, 0, false, false), 0);
        assert_eq!(reduction(DEPTH_ONE_PLY * 4, 0, 0, false, false), 0);
        assert!(reduction(DEPTH_ONE_PLY * 63, 63, 0, false, false) < DEPTH_ONE_PLY * 64);
    }

    #[test]
    fn test_reduction_monotonic() {
        let d = DEPTH_ONE_PLY * 10;
        assert!(reduction(d, 20, 0, false, false) >= reduction(d, 3, 0, false, false));
        assert!(reduction(d, 20, 0, false, false) >= reduction(d, 20, 0, false, true));
        assert!(reduction(d, 20, 0, false, true) >= reduction(d, 20, 0, true, true));
        let max = History::RATIO_MAX;
        assert!(reduction(d, 20, 0, false, true) >= reduction(d, 20, max, false, true));
    }

    #[test]
    fn test_null_depth() {
        let d = DEPTH_ONE_PLY * 8;
        let beta = Score::new(100);
        assert_eq!(null_depth(d, beta, beta), d * 11 / 16 - NULL_DEPTH_REDUCE);
        assert!(null_depth(d, beta + 1000, beta) < null_depth(d, beta, beta));
        assert_eq!(recursive_id_depth(DEPTH_ONE_PLY * 3), DEPTH_ONE_PLY);
        assert_eq!(recursive_id_depth(DEPTH_ONE_PLY * 6), DEPTH_ONE_PLY * 3);
    }

    #[test]
    fn test_futility_margin_shrinks_with_move_count() {
        let d = DEPTH_ONE_PLY * 3;
        assert!(futility_margin(d, 1) > futility_margin(d, 30));
        assert!(futility_margin(DEPTH_ONE_PLY * 6, 1) > futility_margin(DEPTH_ONE_PLY, 1));
        assert_eq!(futility_margin(d, 1000), futility_margin(d, FUT_MOVE_COUNT_MAX - 1));
        assert!(futility_margin(0, FUT_MOVE_COUNT_MAX - 1) > 0);
    }
}
