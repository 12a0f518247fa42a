//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTEntry`: エントリ（16バイト、61bitハッシュ + チェックサム）
//! - `TTBucket`: エントリのグループ（64バイト）
//! - `TranspositionTable`: テーブル本体
//! - 世代管理（3bit、0は空き）
//!
//! 詰みスコアは格納した局面からの手数で持ち、読み出し時にルートからの手数へ戻す。

mod entry;
mod table;

pub use entry::{Bound, MAX_DEPTH, TTEntry, score_from_tt, score_to_tt};
pub use table::{TTBucket, TranspositionTable};

/// バケットあたりのエントリ数
pub const BUCKET_SIZE: usize = 4;

/// 既定のサイズ（MB）
pub const DEFAULT_SIZE_MB: usize = 16;

/// 書き込み結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TTStatus {
    /// 空きに書き込んだ
    New,
    /// 同じ局面のエントリを更新した
    Update,
    /// 別の局面のエントリを追い出した
    Collide,
    /// 既存のエントリの方が深いので書き込まなかった
    Reject,
}
