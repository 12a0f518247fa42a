//! 局面表現モジュール
//!
//! - `Position`: 局面本体（盤面配列・駒種別Bitboard・回転Bitboard・手駒・手番・ハッシュ）
//! - `PieceSet`: 駒種別Bitboardの区分（金と成小駒は共通）
//! - `CheckState`: 王手している駒（最大2つ）
//! - `PositionRecord` / `Handicap`: 外部との受け渡し用レコードと駒落ち
//! - `Zobrist`: 盤面・手駒・手番のハッシュ乱数
//!
//! `do_move` は自玉が取られる手を拒否して局面を元に戻す。
//! 指し手の履歴は持たないので、`undo_move` には `do_move` が返した駒を渡す。

mod pos;
mod record;
mod zobrist;

pub(crate) use pos::{drop_rank_allowed, promotion_options};
pub use pos::{CheckState, PieceSet, Position};
pub use record::{Handicap, PositionError, PositionRecord};
pub use zobrist::{ZOBRIST, Zobrist, zobrist_board, zobrist_hand, zobrist_turn};
