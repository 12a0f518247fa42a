//! 基本型定義
//!
//! - `Color`: 手番
//! - `Square`: 升（81升、9筋1段が0）
//! - `PieceType` / `Piece`: 駒種・駒（1バイト）
//! - `Hand`: 手駒
//! - `Move`: 指し手（32bit、上位16bitは並べ替え用の拡張データ）
//! - `Score`: 評価値

mod color;
mod hand;
mod moves;
mod piece;
mod score;
mod square;

pub use color::Color;
pub use hand::Hand;
pub use moves::Move;
pub use piece::{Piece, PieceType};
pub use score::Score;
pub use square::Square;

/// 探索の深さの単位（1手 = 8）
pub const DEPTH_ONE_PLY: i32 = 8;

/// 探索可能な最大手数（ノードスタックの大きさ）
pub const MAX_PLY: usize = 64;
