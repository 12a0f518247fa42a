//! 升（Square）
//!
//! 升番号は `(9 - 筋) * 9 + (段 - 1)` で、9筋1段が0、1筋9段が80になる。
//! 同じ筋の升が連続して並ぶため、段方向の移動は±1、筋方向の移動は±9。

use std::fmt;

use super::Color;

/// 升
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升の数
    pub const NUM: usize = 81;

    /// 無効な升（どの有効な升番号とも異なる）
    pub const INVALID: Square = Square(0x7f);

    /// 筋・段（いずれも1〜9）から生成
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Square {
        debug_assert!(file >= 1 && file <= 9 && rank >= 1 && rank <= 9);
        Square((9 - file) * 9 + (rank - 1))
    }

    /// 升番号から生成（呼び出し側で範囲を保証する）
    #[inline]
    pub const fn from_index(index: usize) -> Square {
        debug_assert!(index < Square::NUM);
        Square(index as u8)
    }

    /// 升番号から生成（範囲外ならNone）
    #[inline]
    pub const fn try_from_index(index: usize) -> Option<Square> {
        if index < Square::NUM {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    /// 筋・段から生成（盤外ならNone）
    #[inline]
    pub const fn try_new(file: i32, rank: i32) -> Option<Square> {
        if file >= 1 && file <= 9 && rank >= 1 && rank <= 9 {
            Some(Square::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < Square::NUM
    }

    /// 筋（1〜9）
    #[inline]
    pub const fn file(self) -> u8 {
        9 - self.0 / 9
    }

    /// 段（1〜9）
    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 % 9 + 1
    }

    /// 筋インデックス（0 = 9筋 … 8 = 1筋）
    #[inline]
    pub const fn file_index(self) -> usize {
        (self.0 / 9) as usize
    }

    /// 段インデックス（0 = 1段 … 8 = 9段）
    #[inline]
    pub const fn rank_index(self) -> usize {
        (self.0 % 9) as usize
    }

    /// 筋・段をずらした升（盤外ならNone）
    #[inline]
    pub const fn offset(self, file_delta: i32, rank_delta: i32) -> Option<Square> {
        Square::try_new(self.file() as i32 + file_delta, self.rank() as i32 + rank_delta)
    }

    /// 手番から見た前方の升
    #[inline]
    pub const fn forward(self, color: Color) -> Option<Square> {
        self.offset(0, color.forward() as i32)
    }

    /// 手番から見た段（1〜9、敵陣側が1）
    #[inline]
    pub const fn relative_rank(self, color: Color) -> u8 {
        match color {
            Color::Black => self.rank(),
            Color::White => 10 - self.rank(),
        }
    }

    /// 敵陣（成れる領域）かどうか
    #[inline]
    pub const fn is_promotion_zone(self, color: Color) -> bool {
        self.relative_rank(color) <= 3
    }

    /// チェビシェフ距離
    #[inline]
    pub fn distance(self, other: Square) -> u8 {
        let df = (self.file() as i32 - other.file() as i32).unsigned_abs();
        let dr = (self.rank() as i32 - other.rank() as i32).unsigned_abs();
        df.max(dr) as u8
    }

    /// 全升を升番号順に列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Square::NUM as u8).map(Square)
    }
}

impl fmt::Display for Square {
    /// USI形式（例: 7g）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "--");
        }
        write!(f, "{}{}", self.file(), (b'a' + self.rank() - 1) as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_index_layout() {
        assert_eq!(Square::new(9, 1).index(), 0);
        assert_eq!(Square::new(9, 9).index(), 8);
        assert_eq!(Square::new(5, 9).index(), 44);
        assert_eq!(Square::new(4, 1).index(), 45);
        assert_eq!(Square::new(1, 9).index(), 80);
    }

    #[test]
    fn test_square_file_rank_bijection() {
        for sq in Square::all() {
            assert_eq!(Square::new(sq.file(), sq.rank()), sq);
        }
        assert!(!Square::INVALID.is_valid());
        assert!(Square::all().all(|sq| sq != Square::INVALID));
    }

    #[test]
    fn test_square_offset() {
        let sq = Square::new(5, 5);
        assert_eq!(sq.forward(Color::Black), Some(Square::new(5, 4)));
        assert_eq!(sq.forward(Color::White), Some(Square::new(5, 6)));
        assert_eq!(Square::new(1, 1).offset(-1, 0), None);
        assert_eq!(Square::new(1, 1).offset(1, 1), Some(Square::new(2, 2)));
    }

    #[test]
    fn test_square_promotion_zone() {
        assert!(Square::new(3, 3).is_promotion_zone(Color::Black));
        assert!(!Square::new(3, 4).is_promotion_zone(Color::Black));
        assert!(Square::new(3, 7).is_promotion_zone(Color::White));
        assert!(!Square::new(3, 6).is_promotion_zone(Color::White));
    }

    #[test]
    fn test_square_display() {
        assert_eq!(Square::new(7, 7).to_string(), "7g");
        assert_eq!(Square::new(1, 1).to_string(), "1a");
    }
}
