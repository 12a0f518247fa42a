//! 評価値（Score）
//!
//! 置換表には16bitで格納するため、値は常に i16 の範囲に収める。
//! `MATE` 以上（`-MATE` 以下）を詰みスコアとして予約し、
//! `INFINITY - ply` の形で詰みまでの手数を表す。

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// 評価値
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Score(i32);

impl Score {
    pub const ZERO: Score = Score(0);
    /// 探索窓の上限（勝ち確定）
    pub const INFINITY: Score = Score(20000);
    /// これ以上を詰みスコアとみなす
    pub const MATE: Score = Score(15000);
    /// 駒割の上限（玉の交換値にも使う）
    pub const MATERIAL_INFINITY: Score = Score(5000);
    /// 無効値
    pub const INVALID: Score = Score(30000);

    #[inline]
    pub const fn new(v: i32) -> Score {
        Score(v)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// 勝ち側の詰みスコアか
    #[inline]
    pub const fn is_win(self) -> bool {
        self.0 >= Self::MATE.0
    }

    /// 負け側の詰みスコアか
    #[inline]
    pub const fn is_loss(self) -> bool {
        self.0 <= -Self::MATE.0
    }

    #[inline]
    pub const fn is_mate(self) -> bool {
        self.is_win() || self.is_loss()
    }

    /// ply手目で詰ますスコア
    #[inline]
    pub const fn mate_in(ply: i32) -> Score {
        Score(Self::INFINITY.0 - ply)
    }

    /// ply手目で詰まされるスコア
    #[inline]
    pub const fn mated_in(ply: i32) -> Score {
        Score(-Self::INFINITY.0 + ply)
    }

    #[inline]
    pub fn clamp_to_infinity(self) -> Score {
        Score(self.0.clamp(-Self::INFINITY.0, Self::INFINITY.0))
    }
}

impl Neg for Score {
    type Output = Score;

    #[inline]
    fn neg(self) -> Score {
        Score(-self.0)
    }
}

impl Add for Score {
    type Output = Score;

    #[inline]
    fn add(self, rhs: Score) -> Score {
        Score(self.0 + rhs.0)
    }
}

impl Sub for Score {
    type Output = Score;

    #[inline]
    fn sub(self, rhs: Score) -> Score {
        Score(self.0 - rhs.0)
    }
}

impl Add<i32> for Score {
    type Output = Score;

    #[inline]
    fn add(self, rhs: i32) -> Score {
        Score(self.0 + rhs)
    }
}

impl Sub<i32> for Score {
    type Output = Score;

    #[inline]
    fn sub(self, rhs: i32) -> Score {
        Score(self.0 - rhs)
    }
}

impl AddAssign for Score {
    #[inline]
    fn add_assign(&mut self, rhs: Score) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Score {
    #[inline]
    fn sub_assign(&mut self, rhs: Score) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_win() {
            write!(f, "mate {}", Score::INFINITY.0 - self.0)
        } else if self.is_loss() {
            write!(f, "mate -{}", Score::INFINITY.0 + self.0)
        } else {
            write!(f, "cp {}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_mate_range() {
        assert!(Score::mate_in(3).is_win());
        assert!(Score::mated_in(3).is_loss());
        assert!(!Score::new(1000).is_mate());
        assert_eq!(-Score::mate_in(5), Score::mated_in(5));
    }

    #[test]
    fn test_score_fits_i16() {
        assert!(Score::INVALID.raw() <= i16::MAX as i32);
        assert!(-Score::INFINITY.raw() >= i16::MIN as i32);
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::new(120).to_string(), "cp 120");
        assert_eq!(Score::mate_in(3).to_string(), "mate 3");
        assert_eq!(Score::mated_in(2).to_string(), "mate -2");
    }
}
