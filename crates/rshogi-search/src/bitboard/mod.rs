//! ビットボードモジュール
//!
//! 81升の盤面を2本のu64で表現し、回転ビットボードによる遠方駒の利き計算を提供する。
//!
//! - `Bitboard`: 81升の集合（p[0]=9〜5筋, p[1]=4〜1筋）
//! - `RotatedBitboard`: 段・斜め方向に並べ替えた占有ボード
//! - 筋・段のマスク（`FILE_BB`, `RANK_BB`）と敵陣
//! - 近接駒の利きテーブル（歩・桂・銀・金・玉）
//! - 遠方駒の利きテーブル（直線ごと・占有パターンごと）、`between` / `direction`

mod core;
mod rotated;
mod tables;

pub use self::core::{Bitboard, BitboardIter};
pub use rotated::{Line, PATTERN_NUM, RotatedBitboard, file_pattern};
pub use tables::*;
