//! SHEK（千日手・優越局面の検出）
//!
//! - `HandSet`: 手駒の包含比較用ビット列
//! - `ShekTable`: 経路上の局面を記録する表
//! - `ScrDetector`: 連続王手の千日手の判定
//! - `RecordHistory`: ルート以前の棋譜から作る局面列

mod hand_set;
mod scr;
mod table;

use thiserror::Error;

use crate::position::Position;
use crate::types::Move;

pub use hand_set::HandSet;
pub use scr::{PathEntry, ScrDetector, ScrState};
pub use table::{ShekBucket, ShekKey, ShekTable};

/// 記録済みの局面との関係
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShekState {
    /// 該当なし（または優劣がつかない）
    None,
    /// 同一局面
    Equal,
    /// 同一局面の4回目
    Equal4,
    /// 手番側が得をしている
    Superior,
    /// 手番側が損をしている
    Inferior,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("illegal move in record: {ordinal}: {mv}")]
    IllegalMove { ordinal: usize, mv: Move },
}

/// ルート以前の棋譜（各指し手の直前の局面）
#[derive(Debug, Clone, Default)]
pub struct RecordHistory {
    /// SHEK表に登録する鍵（古い順）
    pub keys: Vec<ShekKey>,
    /// 連続王手の判定に使う局面列（古い順）
    pub path: Vec<PathEntry>,
}

impl RecordHistory {
    /// 開始局面から指し手を順に指して局面列を作る
    pub fn replay(initial: &Position, moves: &[Move]) -> Result<Self, RecordError> {
        let mut pos = initial.clone();
        let mut history = RecordHistory {
            keys: Vec::with_capacity(moves.len()),
            path: Vec::with_capacity(moves.len()),
        };
        for (i, &mv) in moves.iter().enumerate() {
            history.keys.push(ShekKey::of(&pos));
            history.path.push(PathEntry { hash: pos.hash(), in_check: pos.in_check() });
            if !pos.validate_move(mv) || pos.do_move(mv).is_none() {
                return Err(RecordError::IllegalMove { ordinal: i + 1, mv });
            }
        }
        Ok(history)
    }

    /// 局面数
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}
