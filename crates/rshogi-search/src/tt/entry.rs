//! 置換表エントリ
//!
//! 2つの64bitワードに詰める。
//!
//! | word | bit   | 内容                          |
//! |------|-------|-------------------------------|
//! | 1    | 0-2   | 世代（0は空き）               |
//! | 1    | 3-63  | ハッシュ値の上位61bit         |
//! | 2    | 0-15  | 指し手（16bit形式）           |
//! | 2    | 16-31 | 評価値（i16）                 |
//! | 2    | 32-33 | 評価値の種類（Bound）         |
//! | 2    | 34-43 | 深さ（1/8手単位）             |
//! | 2    | 44    | 詰めろフラグ                  |
//! | 2    | 48-63 | チェックサム                  |
//!
//! チェックサムはword1とword2の下位48bitを16bitずつXORしたもの。
//! 読み出し時に一致しなければ書き込み途中のエントリとして無視する。

use crate::types::Score;

pub(super) const AGE_MASK: u64 = 0x7;
const HASH_MASK: u64 = !AGE_MASK;

const MOVE_MASK: u64 = 0xffff;
const SCORE_SHIFT: u32 = 16;
const BOUND_SHIFT: u32 = 32;
const BOUND_MASK: u64 = 0x3;
const DEPTH_SHIFT: u32 = 34;
const DEPTH_MASK: u64 = 0x3ff;
const MATE_THREAT_BIT: u64 = 1 << 44;
const DATA_MASK: u64 = (1 << 48) - 1;
const CHECKSUM_SHIFT: u32 = 48;

/// 格納できる深さの上限
pub const MAX_DEPTH: i32 = DEPTH_MASK as i32;

/// 評価値の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Bound {
    /// 評価値なし（PVの指し手だけを持つ）
    None = 0,
    /// 上界（fail-low）
    Upper = 1,
    /// 下界（fail-high）
    Lower = 2,
    /// 正確な値
    Exact = 3,
}

impl Bound {
    #[inline]
    const fn from_bits(bits: u64) -> Bound {
        match bits & BOUND_MASK {
            1 => Bound::Upper,
            2 => Bound::Lower,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    /// 窓(alpha, beta)で得た評価値の種類
    pub fn classify(score: Score, alpha: Score, beta: Score) -> Bound {
        if score >= beta {
            Bound::Lower
        } else if score <= alpha {
            Bound::Upper
        } else {
            Bound::Exact
        }
    }

    /// 下界として使えるか（Lower / Exact）
    #[inline]
    pub const fn is_lower(self) -> bool {
        (self as u8) & (Bound::Lower as u8) != 0
    }

    /// 上界として使えるか（Upper / Exact）
    #[inline]
    pub const fn is_upper(self) -> bool {
        (self as u8) & (Bound::Upper as u8) != 0
    }
}

/// 詰みスコアを「この局面からの手数」に直す
#[inline]
pub fn score_to_tt(score: Score, ply: i32) -> Score {
    if score.is_win() {
        Score::new((score.raw() + ply).min(Score::INFINITY.raw()))
    } else if score.is_loss() {
        Score::new((score.raw() - ply).max(-Score::INFINITY.raw()))
    } else {
        score
    }
}

/// 置換表の詰みスコアを「ルートからの手数」に直す
#[inline]
pub fn score_from_tt(score: Score, ply: i32) -> Score {
    if score.is_win() {
        score - ply
    } else if score.is_loss() {
        score + ply
    } else {
        score
    }
}

#[inline]
const fn checksum(word1: u64, word2: u64) -> u64 {
    let x = word1 ^ (word2 & DATA_MASK);
    (x ^ (x >> 16) ^ (x >> 32) ^ (x >> 48)) & 0xffff
}

/// 置換表エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct TTEntry {
    word1: u64,
    word2: u64,
}

impl TTEntry {
    pub const EMPTY: TTEntry = TTEntry { word1: 0, word2: 0 };

    #[allow(clippy::too_many_arguments)]
    pub(super) fn pack(
        hash: u64,
        age: u8,
        move16: u16,
        score: Score,
        bound: Bound,
        depth: i32,
        mate_threat: bool,
    ) -> TTEntry {
        debug_assert!(age != 0 && u64::from(age) <= AGE_MASK);
        debug_assert!(score.raw() >= i16::MIN as i32 && score.raw() <= i16::MAX as i32);
        let word1 = (hash & HASH_MASK) | u64::from(age);
        let mut word2 = u64::from(move16)
            | (u64::from(score.raw() as i16 as u16) << SCORE_SHIFT)
            | ((bound as u64) << BOUND_SHIFT)
            | ((depth.clamp(0, MAX_DEPTH) as u64) << DEPTH_SHIFT);
        if mate_threat {
            word2 |= MATE_THREAT_BIT;
        }
        word2 |= checksum(word1, word2) << CHECKSUM_SHIFT;
        TTEntry { word1, word2 }
    }

    /// チェックサムが一致し、空きでないか
    #[inline]
    pub fn is_live(&self) -> bool {
        self.age() != 0 && (self.word2 >> CHECKSUM_SHIFT) == checksum(self.word1, self.word2)
    }

    /// hashのエントリか
    #[inline]
    pub fn matches(&self, hash: u64) -> bool {
        (self.word1 ^ hash) & HASH_MASK == 0 && self.is_live()
    }

    #[inline]
    pub fn age(&self) -> u8 {
        (self.word1 & AGE_MASK) as u8
    }

    #[inline]
    pub fn move16(&self) -> u16 {
        (self.word2 & MOVE_MASK) as u16
    }

    /// 格納値そのもの（詰みスコアは格納した局面からの手数）
    #[inline]
    pub fn raw_score(&self) -> Score {
        Score::new(i32::from((self.word2 >> SCORE_SHIFT) as u16 as i16))
    }

    /// ルートからply手目の局面として読み出した評価値
    #[inline]
    pub fn score(&self, ply: i32) -> Score {
        score_from_tt(self.raw_score(), ply)
    }

    #[inline]
    pub fn bound(&self) -> Bound {
        Bound::from_bits(self.word2 >> BOUND_SHIFT)
    }

    #[inline]
    pub fn depth(&self) -> i32 {
        ((self.word2 >> DEPTH_SHIFT) & DEPTH_MASK) as i32
    }

    #[inline]
    pub fn is_mate_threat(&self) -> bool {
        self.word2 & MATE_THREAT_BIT != 0
    }

    /// 詰みが確定した値を持つか
    #[inline]
    pub fn is_mate_resolved(&self) -> bool {
        self.bound() != Bound::None && self.raw_score().is_mate()
    }

    /// 世代だけを付け替える
    pub(super) fn with_age(self, age: u8) -> TTEntry {
        TTEntry::pack(
            self.word1,
            age,
            self.move16(),
            self.raw_score(),
            self.bound(),
            self.depth(),
            self.is_mate_threat(),
        )
    }

    /// 書き込みが途中で中断された状態を作る（テスト用）
    #[cfg(test)]
    pub(crate) fn corrupt(&mut self) {
        self.word2 ^= 1 << SCORE_SHIFT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_layout() {
        let hash = 0xdead_beef_cafe_f00d;
        let e = TTEntry::pack(hash, 3, 0x1234, Score::new(-321), Bound::Lower, 200, true);
        assert!(e.is_live());
        assert!(e.matches(hash));
        assert!(e.matches(hash ^ 0x5));
        assert!(!e.matches(hash ^ 0x8));
        assert_eq!(e.age(), 3);
        assert_eq!(e.move16(), 0x1234);
        assert_eq!(e.raw_score(), Score::new(-321));
        assert_eq!(e.bound(), Bound::Lower);
        assert_eq!(e.depth(), 200);
        assert!(e.is_mate_threat());
    }

    #[test]
    fn test_depth_is_clamped() {
        let e = TTEntry::pack(0, 1, 0, Score::ZERO, Bound::Exact, 5000, false);
        assert_eq!(e.depth(), MAX_DEPTH);
        let e = TTEntry::pack(0, 1, 0, Score::ZERO, Bound::Exact, -3, false);
        assert_eq!(e.depth(), 0);
    }

    #[test]
    fn test_checksum_rejects_torn_entry() {
        let mut e = TTEntry::pack(0x1111_2222_3333_4440, 1, 7, Score::new(50), Bound::Exact, 16, false);
        assert!(e.is_live());
        e.corrupt();
        assert!(!e.is_live());
        assert!(!TTEntry::EMPTY.is_live());
    }

    #[test]
    fn test_mate_score_rebasing() {
        let found = Score::mate_in(9);
        let stored = score_to_tt(found, 4);
        assert_eq!(stored, Score::mate_in(5));
        assert_eq!(score_from_tt(stored, 4), found);
        assert_eq!(score_from_tt(stored, 6), found - 2);

        let lost = Score::mated_in(9);
        let stored = score_to_tt(lost, 4);
        assert_eq!(score_from_tt(stored, 4), lost);
        assert_eq!(score_from_tt(stored, 2), lost - 2);

        assert_eq!(score_to_tt(Score::new(300), 10), Score::new(300));
    }

    #[test]
    fn test_bound_classify() {
        let (a, b) = (Score::new(-10), Score::new(10));
        assert_eq!(Bound::classify(Score::new(10), a, b), Bound::Lower);
        assert_eq!(Bound::classify(Score::new(-10), a, b), Bound::Upper);
        assert_eq!(Bound::classify(Score::ZERO, a, b), Bound::Exact);
        assert!(Bound::Exact.is_lower() && Bound::Exact.is_upper());
        assert!(!Bound::None.is_lower() && !Bound::None.is_upper());
    }
}
