//! 指し手（Move）
//!
//! 32bitのビットレイアウト:
//!
//! | bit    | 内容                                   |
//! |--------|----------------------------------------|
//! | 0-6    | 移動先                                 |
//! | 7-13   | 移動元（駒打ちの場合は打つ駒種）       |
//! | 14     | 成り                                   |
//! | 15     | 駒打ち                                 |
//! | 16-31  | 拡張データ（並べ替え用のスコアなど）   |
//!
//! 下位16bitがそのまま16bit形式になる。等値比較は拡張データを無視する。

use std::fmt;
use std::hash::{Hash, Hasher};

use super::{PieceType, Square};
use crate::position::Position;

const TO_MASK: u32 = 0x0000_007f;
const FROM_SHIFT: u32 = 7;
const FROM_MASK: u32 = 0x0000_3f80;
const PROMOTE_FLAG: u32 = 0x0000_4000;
const DROP_FLAG: u32 = 0x0000_8000;
const BODY_MASK: u32 = 0x0000_ffff;
const EXT_SHIFT: u32 = 16;

// 各フィールドが重ならないこと
const _: () = assert!(TO_MASK & FROM_MASK == 0);
const _: () = assert!((TO_MASK | FROM_MASK) & (PROMOTE_FLAG | DROP_FLAG) == 0);
const _: () = assert!(TO_MASK | FROM_MASK | PROMOTE_FLAG | DROP_FLAG == BODY_MASK);

/// 指し手
#[derive(Clone, Copy, Default)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    /// 指し手なし
    pub const NONE: Move = Move(0);

    /// 盤上の駒を動かす手
    #[inline]
    pub const fn new(from: Square, to: Square, promote: bool) -> Move {
        debug_assert!(from.is_valid() && to.is_valid());
        let mut raw = (to.raw() as u32) | ((from.raw() as u32) << FROM_SHIFT);
        if promote {
            raw |= PROMOTE_FLAG;
        }
        Move(raw)
    }

    /// 駒打ち
    #[inline]
    pub const fn new_drop(piece_type: PieceType, to: Square) -> Move {
        debug_assert!(to.is_valid());
        Move((to.raw() as u32) | ((piece_type.raw() as u32) << FROM_SHIFT) | DROP_FLAG)
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 & BODY_MASK == 0
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index((self.0 & TO_MASK) as usize)
    }

    /// 移動元（駒打ちに対して呼んではならない）
    #[inline]
    pub const fn from(self) -> Square {
        debug_assert!(!self.is_drop());
        Square::from_index(((self.0 & FROM_MASK) >> FROM_SHIFT) as usize)
    }

    /// 打つ駒種（駒打ちのみ）
    #[inline]
    pub const fn drop_piece_type(self) -> PieceType {
        debug_assert!(self.is_drop());
        PieceType::from_raw(((self.0 & FROM_MASK) >> FROM_SHIFT) as u8)
    }

    #[inline]
    pub const fn is_drop(self) -> bool {
        self.0 & DROP_FLAG != 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.0 & PROMOTE_FLAG != 0
    }

    /// 拡張データ
    #[inline]
    pub const fn ext(self) -> u16 {
        (self.0 >> EXT_SHIFT) as u16
    }

    /// 拡張データを符号付きで取得（並べ替えスコア用）
    #[inline]
    pub const fn ext_score(self) -> i16 {
        self.ext() as i16
    }

    #[inline]
    pub const fn with_ext(self, ext: u16) -> Move {
        Move((self.0 & BODY_MASK) | ((ext as u32) << EXT_SHIFT))
    }

    #[inline]
    pub fn set_ext_score(&mut self, score: i16) {
        *self = self.with_ext(score as u16);
    }

    /// 拡張データを取り除く
    #[inline]
    pub const fn without_ext(self) -> Move {
        Move(self.0 & BODY_MASK)
    }

    /// 32bit形式（拡張データを含む）
    #[inline]
    pub const fn serialize(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn deserialize(value: u32) -> Move {
        Move(value)
    }

    /// 16bit形式（拡張データを含まない）
    #[inline]
    pub const fn serialize16(self) -> u16 {
        (self.0 & BODY_MASK) as u16
    }

    /// 16bit形式から局面を参照して復元する
    ///
    /// 移動元に手番側の駒がない、打つ駒が手駒にないなど、
    /// その局面で意味を持たない値の場合は `None` を返す。
    pub fn deserialize16(value: u16, pos: &Position) -> Option<Move> {
        let mv = Move(value as u32);
        if mv.is_none() {
            return None;
        }
        let to_raw = (mv.0 & TO_MASK) as usize;
        let from_raw = ((mv.0 & FROM_MASK) >> FROM_SHIFT) as usize;
        if to_raw >= Square::NUM {
            return None;
        }
        let us = pos.side_to_move();
        if mv.is_drop() {
            if from_raw >= PieceType::HAND_NUM || mv.is_promotion() {
                return None;
            }
            let pt = PieceType::from_raw(from_raw as u8);
            if !pos.hand(us).has(pt) || !pos.piece_on(mv.to()).is_empty() {
                return None;
            }
        } else {
            if from_raw >= Square::NUM || from_raw == to_raw {
                return None;
            }
            let piece = pos.piece_on(mv.from());
            if !piece.is_color(us) {
                return None;
            }
            if mv.is_promotion() && !piece.piece_type().can_promote() {
                return None;
            }
        }
        Some(mv)
    }

    /// USI形式（例: 7g7f, 8h2b+, P*5e）
    pub fn to_usi_string(self) -> String {
        self.to_string()
    }
}

impl PartialEq for Move {
    #[inline]
    fn eq(&self, other: &Move) -> bool {
        (self.0 ^ other.0) & BODY_MASK == 0
    }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 & BODY_MASK).hash(state);
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        if self.is_drop() {
            write!(f, "{}*{}", self.drop_piece_type().usi_char(), self.to())
        } else {
            write!(f, "{}{}", self.from(), self.to())?;
            if self.is_promotion() {
                f.write_str("+")?;
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, ext={})", self.ext_score())
    }
}
