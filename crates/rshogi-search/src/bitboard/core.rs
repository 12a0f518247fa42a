//! Bitboard（81升を2本のu64で表現）

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, Shr};

use crate::types::Square;

/// p[0]に入る升の数（9〜5筋）
const LANE0_SQUARES: usize = 45;
const LANE0_MASK: u64 = (1u64 << LANE0_SQUARES) - 1;
const LANE1_MASK: u64 = (1u64 << (Square::NUM - LANE0_SQUARES)) - 1;

// 筋の境界とレーンの境界が一致すること
const _: () = assert!(LANE0_SQUARES % 9 == 0);

/// Bitboard
///
/// 升番号順の配置:
/// - p[0]: 9〜5筋（bit 0-44）
/// - p[1]: 4〜1筋（bit 0-35）
///
/// 筋がレーンをまたがないので、段方向のシフトはレーン単位で行える。
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(C, align(16))]
pub struct Bitboard {
    p: [u64; 2],
}

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard { p: [0, 0] };

    /// 全升が立っているBitboard
    pub const ALL: Bitboard = Bitboard { p: [LANE0_MASK, LANE1_MASK] };

    #[inline]
    pub const fn new(p0: u64, p1: u64) -> Bitboard {
        Bitboard { p: [p0 & LANE0_MASK, p1 & LANE1_MASK] }
    }

    /// 升に対応する (レーン, ビット位置)
    #[inline]
    pub(crate) const fn lane_bit(sq: Square) -> (usize, u32) {
        let idx = sq.index();
        if idx < LANE0_SQUARES { (0, idx as u32) } else { (1, (idx - LANE0_SQUARES) as u32) }
    }

    #[inline]
    pub const fn from_square(sq: Square) -> Bitboard {
        let (lane, bit) = Self::lane_bit(sq);
        let mut p = [0u64; 2];
        p[lane] = 1u64 << bit;
        Bitboard { p }
    }

    /// レーンの生の値
    #[inline]
    pub const fn lane(self, lane: usize) -> u64 {
        self.p[lane]
    }

    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        let (lane, bit) = Self::lane_bit(sq);
        self.p[lane] & (1u64 << bit) != 0
    }

    #[inline]
    pub fn set(&mut self, sq: Square) {
        let (lane, bit) = Self::lane_bit(sq);
        self.p[lane] |= 1u64 << bit;
    }

    #[inline]
    pub fn clear(&mut self, sq: Square) {
        let (lane, bit) = Self::lane_bit(sq);
        self.p[lane] &= !(1u64 << bit);
    }

    /// ビットを反転
    #[inline]
    pub fn toggle(&mut self, sq: Square) {
        let (lane, bit) = Self::lane_bit(sq);
        self.p[lane] ^= 1u64 << bit;
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        (self.p[0] | self.p[1]) == 0
    }

    #[inline]
    pub const fn is_not_empty(self) -> bool {
        !self.is_empty()
    }

    #[inline]
    pub const fn count(self) -> u32 {
        self.p[0].count_ones() + self.p[1].count_ones()
    }

    /// 2つ以上のビットが立っているか
    #[inline]
    pub const fn more_than_one(self) -> bool {
        self.count() > 1
    }

    /// `self & !other`
    #[inline]
    pub const fn and_not(self, other: Bitboard) -> Bitboard {
        Bitboard { p: [self.p[0] & !other.p[0], self.p[1] & !other.p[1]] }
    }

    /// 最下位ビットの升を取得して消す（空ならNone）
    #[inline]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        if self.p[0] != 0 {
            let idx = self.p[0].trailing_zeros() as usize;
            self.p[0] &= self.p[0] - 1;
            Some(Square::from_index(idx))
        } else if self.p[1] != 0 {
            let idx = self.p[1].trailing_zeros() as usize;
            self.p[1] &= self.p[1] - 1;
            Some(Square::from_index(LANE0_SQUARES + idx))
        } else {
            None
        }
    }

    /// 最下位ビットの升（消さない）
    #[inline]
    pub fn lsb(self) -> Option<Square> {
        let mut bb = self;
        bb.pop_lsb()
    }

    #[inline]
    pub fn iter(self) -> BitboardIter {
        BitboardIter(self)
    }
}

impl BitAnd for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitand(self, rhs: Bitboard) -> Bitboard {
        Bitboard { p: [self.p[0] & rhs.p[0], self.p[1] & rhs.p[1]] }
    }
}

impl BitOr for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitor(self, rhs: Bitboard) -> Bitboard {
        Bitboard { p: [self.p[0] | rhs.p[0], self.p[1] | rhs.p[1]] }
    }
}

impl BitXor for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn bitxor(self, rhs: Bitboard) -> Bitboard {
        Bitboard { p: [self.p[0] ^ rhs.p[0], self.p[1] ^ rhs.p[1]] }
    }
}

impl Not for Bitboard {
    type Output = Bitboard;

    /// 盤外のビットは立てない
    #[inline]
    fn not(self) -> Bitboard {
        Bitboard { p: [!self.p[0] & LANE0_MASK, !self.p[1] & LANE1_MASK] }
    }
}

impl BitAndAssign for Bitboard {
    #[inline]
    fn bitand_assign(&mut self, rhs: Bitboard) {
        self.p[0] &= rhs.p[0];
        self.p[1] &= rhs.p[1];
    }
}

impl BitOrAssign for Bitboard {
    #[inline]
    fn bitor_assign(&mut self, rhs: Bitboard) {
        self.p[0] |= rhs.p[0];
        self.p[1] |= rhs.p[1];
    }
}

impl BitXorAssign for Bitboard {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Bitboard) {
        self.p[0] ^= rhs.p[0];
        self.p[1] ^= rhs.p[1];
    }
}

/// レーンごとの左シフト（レーン間の桁上がりなし）
impl Shl<u32> for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn shl(self, rhs: u32) -> Bitboard {
        Bitboard { p: [(self.p[0] << rhs) & LANE0_MASK, (self.p[1] << rhs) & LANE1_MASK] }
    }
}

/// レーンごとの右シフト
impl Shr<u32> for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn shr(self, rhs: u32) -> Bitboard {
        Bitboard { p: [self.p[0] >> rhs, self.p[1] >> rhs] }
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    fn into_iter(self) -> BitboardIter {
        BitboardIter(self)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitboard {{")?;
        for rank in 1..=9u8 {
            for file in (1..=9u8).rev() {
                let mark = if self.contains(Square::new(file, rank)) { "●" } else { "・" };
                f.write_str(mark)?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

/// Bitboardイテレータ
pub struct BitboardIter(Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        self.0.pop_lsb()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.count() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for BitboardIter {}
