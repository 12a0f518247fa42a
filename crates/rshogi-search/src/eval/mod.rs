//! 評価関数
//!
//! 探索は評価器を先手視点の評価値を返すオラクルとしてだけ扱う。

pub mod material;

use crate::position::Position;
use crate::types::{Color, Move, Piece, Score};

pub use material::MaterialEvaluator;

/// 評価器
pub trait Evaluator {
    /// 局面の駒割（先手視点）
    fn evaluate_material(&self, pos: &Position) -> Score;

    /// 指し手による駒割の差分更新
    ///
    /// `pos` は `mv` を指した後の局面、`captured` は取った駒（なければ空）。
    fn evaluate_diff(&self, prev: Score, pos: &Position, mv: Move, captured: Piece) -> Score;

    /// 手番側から見た静的評価値
    fn evaluate(&self, material: Score, pos: &Position) -> Score {
        match pos.side_to_move() {
            Color::Black => material,
            Color::White => -material,
        }
    }
}
