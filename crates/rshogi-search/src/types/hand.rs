//! 手駒（Hand）

use serde::{Deserialize, Serialize};

use super::PieceType;

/// 片方の手番の手駒（駒種ごとの枚数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand {
    counts: [u8; PieceType::HAND_NUM],
}

impl Hand {
    /// 駒種ごとの最大枚数
    pub const MAX_COUNTS: [u8; PieceType::HAND_NUM] = [18, 4, 4, 4, 4, 2, 2];

    pub const EMPTY: Hand = Hand { counts: [0; PieceType::HAND_NUM] };

    /// 駒種ごとの枚数から生成
    pub const fn from_counts(counts: [u8; PieceType::HAND_NUM]) -> Hand {
        Hand { counts }
    }

    #[inline]
    pub const fn get(&self, piece_type: PieceType) -> u8 {
        self.counts[piece_type.hand_index()]
    }

    #[inline]
    pub fn set(&mut self, piece_type: PieceType, count: u8) {
        self.counts[piece_type.hand_index()] = count;
    }

    /// 1枚増やし、増やした後の枚数を返す
    #[inline]
    pub fn increment(&mut self, piece_type: PieceType) -> u8 {
        let c = &mut self.counts[piece_type.hand_index()];
        debug_assert!(*c < Hand::MAX_COUNTS[piece_type.hand_index()]);
        *c += 1;
        *c
    }

    /// 1枚減らし、減らす前の枚数を返す
    #[inline]
    pub fn decrement(&mut self, piece_type: PieceType) -> u8 {
        let c = &mut self.counts[piece_type.hand_index()];
        debug_assert!(*c > 0);
        let prev = *c;
        *c -= 1;
        prev
    }

    #[inline]
    pub const fn has(&self, piece_type: PieceType) -> bool {
        self.get(piece_type) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&c| c as u32).sum()
    }

    /// 枚数が上限を超えていないか
    pub fn is_within_limits(&self) -> bool {
        self.counts.iter().zip(Hand::MAX_COUNTS.iter()).all(|(c, max)| c <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_increment_decrement() {
        let mut hand = Hand::default();
        assert!(hand.is_empty());
        assert_eq!(hand.increment(PieceType::PAWN), 1);
        assert_eq!(hand.increment(PieceType::PAWN), 2);
        assert_eq!(hand.increment(PieceType::ROOK), 1);
        assert_eq!(hand.total(), 3);
        assert_eq!(hand.decrement(PieceType::PAWN), 2);
        assert_eq!(hand.get(PieceType::PAWN), 1);
        assert!(hand.has(PieceType::ROOK));
        assert!(!hand.has(PieceType::GOLD));
    }

    #[test]
    fn test_hand_limits() {
        let mut hand = Hand::from_counts([18, 4, 4, 4, 4, 2, 2]);
        assert!(hand.is_within_limits());
        hand.set(PieceType::BISHOP, 3);
        assert!(!hand.is_within_limits());
    }
}
