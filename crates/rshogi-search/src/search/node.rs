//! ノードスタック
//!
//! 探索木の各plyの作業領域。反復深化の間も使い回す。

use std::fmt;

use smallvec::SmallVec;

use super::movepicker::MovePicker;
use crate::position::CheckState;
use crate::types::{MAX_PLY, Move, Piece, Score};

// =============================================================================
// NodeStat
// =============================================================================

/// ノードで許可する探索処理のフラグ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat(u8);

impl NodeStat {
    pub const NULL_MOVE_SEARCH: u8 = 0x01;
    pub const RECURSIVE_ID_SEARCH: u8 = 0x02;
    pub const MATE_THREAT: u8 = 0x04;
    pub const HASH_CUT: u8 = 0x08;
    pub const RECAPTURE_EXTENSION: u8 = 0x10;
    pub const MATE_DETECTION: u8 = 0x20;

    const DEFAULT: u8 = Self::NULL_MOVE_SEARCH
        | Self::RECURSIVE_ID_SEARCH
        | Self::HASH_CUT
        | Self::RECAPTURE_EXTENSION
        | Self::MATE_DETECTION;

    /// 通常のノード（詰めろフラグ以外すべて許可）
    #[inline]
    pub const fn normal() -> Self {
        NodeStat(Self::DEFAULT)
    }

    /// 何も許可しない
    #[inline]
    pub const fn empty() -> Self {
        NodeStat(0)
    }

    #[inline]
    pub const fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    #[inline]
    pub fn unset(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    #[inline]
    #[must_use]
    pub const fn without(self, flag: u8) -> Self {
        NodeStat(self.0 & !flag)
    }
}

impl Default for NodeStat {
    fn default() -> Self {
        Self::normal()
    }
}

// =============================================================================
// PV
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PvEntry {
    mv: Move,
    depth: i32,
}

/// 読み筋（指し手とその指し手を探索した深さ）
#[derive(Clone)]
pub struct Pv {
    entries: [PvEntry; MAX_PLY],
    len: usize,
}

impl Pv {
    pub fn new() -> Self {
        Pv { entries: [PvEntry::default(); MAX_PLY], len: 0 }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// i手目
    #[inline]
    pub fn get(&self, i: usize) -> Option<Move> {
        (i < self.len).then(|| self.entries[i].mv)
    }

    /// i手目を探索した深さ
    #[inline]
    pub fn depth(&self, i: usize) -> Option<i32> {
        (i < self.len).then(|| self.entries[i].depth)
    }

    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.entries[..self.len].iter().map(|e| e.mv)
    }

    /// 先頭をmvにし、続きに子ノードの読み筋をつなげる
    pub fn set(&mut self, mv: Move, depth: i32, child: &Pv) {
        self.entries[0] = PvEntry { mv: mv.without_ext(), depth };
        let n = child.len.min(MAX_PLY - 1);
        self.entries[1..=n].copy_from_slice(&child.entries[..n]);
        self.len = n + 1;
    }

    /// 先頭から一致する手数
    pub fn common_prefix_len(&self, other: &Pv) -> usize {
        self.moves().zip(other.moves()).take_while(|(a, b)| a == b).count()
    }
}

impl Default for Pv {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Pv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pv({self})")
    }
}

// =============================================================================
// Node
// =============================================================================

/// 1ply分の作業領域
pub(crate) struct Node {
    /// 局面のハッシュ（手番を含む）
    pub hash: u64,
    pub check_state: CheckState,
    /// 駒割（先手視点）
    pub material: Score,
    /// 手番側から見た静的評価（王手がかかっていればNone）
    pub static_eval: Option<Score>,
    /// このノードで指した手とそれで取った駒
    pub mv: Move,
    pub captured: Piece,
    /// 評価値がSHEKや打ち切りで決まった（置換表に書かない）
    pub is_historical: bool,
    pub killers: [Move; 2],
    pub picker: MovePicker,
    /// 試した静かな手
    pub quiets_tried: SmallVec<[Move; 64]>,
    pub pv: Pv,
}

impl Node {
    pub fn new() -> Self {
        Node {
            hash: 0,
            check_state: CheckState::NONE,
            material: Score::ZERO,
            static_eval: None,
            mv: Move::NONE,
            captured: Piece::EMPTY,
            is_historical: false,
            killers: [Move::NONE; 2],
            picker: MovePicker::new(),
            quiets_tried: SmallVec::new(),
            pv: Pv::new(),
        }
    }

    /// キラー手を登録する
    pub fn add_killer(&mut self, mv: Move) {
        let mv = mv.without_ext();
        if self.killers[0] != mv {
            self.killers[1] = self.killers[0];
            self.killers[0] = mv;
        }
    }
}
