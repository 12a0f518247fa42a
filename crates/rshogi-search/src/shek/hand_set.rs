//! 手駒の包含比較用ビット列
//!
//! 駒種ごとに枚数分の1を並べたビット列にする（3枚なら `0b111`）。
//! 各駒種の領域は最大枚数分の幅を持つので、2つの手駒の包含関係は
//! ビット列の包含関係と一致する。
//!
//! | 駒種 | bit   |
//! |------|-------|
//! | 飛   | 0-1   |
//! | 角   | 2-3   |
//! | 金   | 4-7   |
//! | 銀   | 8-11  |
//! | 桂   | 12-15 |
//! | 香   | 16-19 |
//! | 歩   | 20-37 |

use std::fmt;

use super::ShekState;
use crate::types::{Hand, PieceType};

/// 手駒の包含比較用ビット列
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HandSet(u64);

impl HandSet {
    /// 上位の駒種から順に詰めるときの、次の駒種のためのシフト量
    const SHIFTS: [(PieceType, u32); PieceType::HAND_NUM] = [
        (PieceType::PAWN, 0),
        (PieceType::LANCE, 4),
        (PieceType::KNIGHT, 4),
        (PieceType::SILVER, 4),
        (PieceType::GOLD, 4),
        (PieceType::BISHOP, 2),
        (PieceType::ROOK, 2),
    ];

    pub fn new(hand: &Hand) -> HandSet {
        let mut set = 0u64;
        for (pt, shift) in Self::SHIFTS {
            debug_assert!(hand.get(pt) <= Hand::MAX_COUNTS[pt.hand_index()]);
            set <<= shift;
            set |= (1u64 << hand.get(pt)) - 1;
        }
        HandSet(set)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// selfがrhsに対してどういう関係にあるか
    ///
    /// selfがrhsの全ての駒を含み、さらに多く持つなら `Superior`。
    pub fn compare_to(self, rhs: HandSet) -> ShekState {
        if self.0 == rhs.0 {
            return ShekState::Equal;
        }
        let sup = self.0 & !rhs.0 != 0;
        let inf = !self.0 & rhs.0 != 0;
        match (sup, inf) {
            (true, false) => ShekState::Superior,
            (false, true) => ShekState::Inferior,
            _ => ShekState::None,
        }
    }
}

impl From<&Hand> for HandSet {
    fn from(hand: &Hand) -> Self {
        HandSet::new(hand)
    }
}

impl fmt::Debug for HandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandSet({:#x})", self.0)
    }
}
