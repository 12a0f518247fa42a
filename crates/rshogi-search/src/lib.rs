//! 将棋の指し手探索コア
//!
//! 回転ビットボードによる局面表現と指し手生成、静止探索・置換表・
//! 千日手/優越局面検出（SHEK）を備えた反復深化 alpha-beta 探索。
//!
//! - `types`: 升・駒・指し手・評価値などの基本型
//! - `bitboard`: ビットボードと回転ビットボード、利きテーブル
//! - `position`: 局面（差分更新、Zobristハッシュ）
//! - `movegen`: 擬似合法手生成
//! - `eval`: 評価関数インタフェースと駒割評価
//! - `see`: 静的駒交換評価
//! - `mate`: 1手詰め判定
//! - `table` / `tt` / `shek`: 汎用ハッシュ表、置換表、SHEK表
//! - `search`: 探索本体

pub mod bitboard;
pub mod eval;
pub mod mate;
pub mod movegen;
pub mod position;
pub mod search;
pub mod see;
pub mod shek;
pub mod table;
pub mod tt;
pub mod types;

pub use eval::{Evaluator, MaterialEvaluator};
pub use position::Position;
pub use search::{SearchConfig, SearchHandler, SearchResult, Searcher};
pub use types::{Color, Move, Piece, PieceType, Score, Square};
