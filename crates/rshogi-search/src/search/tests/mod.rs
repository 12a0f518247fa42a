//! 探索のテスト

mod playout;
mod repetition;

use crate::movegen::{MoveList, generate_legal};
use crate::position::{Position, PositionRecord};
use crate::search::SearchConfig;
use crate::types::{Color, Move, Piece, PieceType, Square};

pub(super) type Placement = (u8, u8, Color, PieceType);

pub(super) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 盤上の駒と手駒から局面を作る
pub(super) fn build(
    turn: Color,
    pieces: &[Placement],
    hands: &[(Color, PieceType, u8)],
) -> anyhow::Result<Position> {
    let mut record = PositionRecord::empty(turn);
    for &(file, rank, c, pt) in pieces {
        record.put(Square::new(file, rank), Piece::new(c, pt));
    }
    for &(c, pt, n) in hands {
        record.hands[c.index()].set(pt, n);
    }
    Ok(Position::from_record(&record)?)
}

/// 時間制限なし・小さな置換表
pub(super) fn test_config() -> SearchConfig {
    SearchConfig { tt_size_mb: 1, ..SearchConfig::infinite() }
}

pub(super) fn legal_moves(pos: &Position) -> MoveList {
    let mut pos = pos.clone();
    let mut list = MoveList::new();
    generate_legal(&mut pos, &mut list);
    list
}

pub(super) fn is_legal(pos: &Position, mv: Move) -> bool {
    legal_moves(pos).contains(&mv)
}
