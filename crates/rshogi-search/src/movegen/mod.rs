//! 指し手生成

mod generator;

use smallvec::SmallVec;

use crate::types::Move;

pub use generator::{
    GenType, generate, generate_all, generate_captures, generate_evasions, generate_legal,
    generate_not_captures,
};

/// 1局面分の指し手リスト（通常はヒープ確保なし）
pub type MoveList = SmallVec<[Move; 128]>;
