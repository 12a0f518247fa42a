//! 駒割（駒の価値による評価）
//!
//! - 駒価値: 盤上・手駒にある駒1枚の価値
//! - 交換値: その駒を取ったときの評価値の変化（相手から失われ、自分の手駒に加わる）
//! - 成り価値: 成ったときの評価値の変化

use crate::position::Position;
use crate::types::{Color, Move, Piece, PieceType, Score};

use super::Evaluator;

pub const PAWN: i32 = 115;
pub const LANCE: i32 = 246;
pub const KNIGHT: i32 = 273;
pub const SILVER: i32 = 414;
pub const GOLD: i32 = 504;
pub const BISHOP: i32 = 625;
pub const ROOK: i32 = 695;
pub const TOKIN: i32 = 535;
pub const PRO_LANCE: i32 = 424;
pub const PRO_KNIGHT: i32 = 469;
pub const PRO_SILVER: i32 = 429;
pub const HORSE: i32 = 768;
pub const DRAGON: i32 = 903;

const KING: i32 = Score::MATERIAL_INFINITY.raw();

/// 駒価値 [PieceType]
const SCORES: [i32; PieceType::NUM] = [
    PAWN, LANCE, KNIGHT, SILVER, GOLD, BISHOP, ROOK, KING, TOKIN, PRO_LANCE, PRO_KNIGHT,
    PRO_SILVER, 0, HORSE, DRAGON,
];

/// 交換値 [PieceType]
const EXCHANGE_SCORES: [i32; PieceType::NUM] = [
    PAWN * 2,
    LANCE * 2,
    KNIGHT * 2,
    SILVER * 2,
    GOLD * 2,
    BISHOP * 2,
    ROOK * 2,
    KING,
    TOKIN + PAWN,
    PRO_LANCE + LANCE,
    PRO_KNIGHT + KNIGHT,
    PRO_SILVER + SILVER,
    0,
    HORSE + BISHOP,
    DRAGON + ROOK,
];

/// 成り価値 [PieceType]（成る前の駒種で引く）
const PROMOTION_SCORES: [i32; PieceType::NUM] = [
    TOKIN - PAWN,
    PRO_LANCE - LANCE,
    PRO_KNIGHT - KNIGHT,
    PRO_SILVER - SILVER,
    0,
    HORSE - BISHOP,
    DRAGON - ROOK,
    0,
    0,
    0,
    0,
    0,
    0,
    0,
    0,
];

#[inline]
pub fn score(pt: PieceType) -> Score {
    Score::new(SCORES[pt.index()])
}

#[inline]
pub fn exchange_score(pt: PieceType) -> Score {
    Score::new(EXCHANGE_SCORES[pt.index()])
}

#[inline]
pub fn promotion_score(pt: PieceType) -> Score {
    Score::new(PROMOTION_SCORES[pt.index()])
}

/// 駒割だけで評価する評価器
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl MaterialEvaluator {
    pub fn new() -> Self {
        MaterialEvaluator
    }
}

impl Evaluator for MaterialEvaluator {
    fn evaluate_material(&self, pos: &Position) -> Score {
        let mut total = 0;
        for c in Color::ALL {
            let hand = pos.hand(c);
            let sum: i32 = PieceType::HAND
                .iter()
                .map(|&pt| SCORES[pt.index()] * i32::from(hand.get(pt)))
                .sum();
            total += c.sign() * sum;
        }
        for sq in pos.occupied().iter() {
            let pc = pos.piece_on(sq);
            if pc.piece_type() == PieceType::KING {
                continue;
            }
            total += pc.color().sign() * SCORES[pc.piece_type().index()];
        }
        Score::new(total)
    }

    fn evaluate_diff(&self, prev: Score, pos: &Position, mv: Move, captured: Piece) -> Score {
        // 指した側（局面はすでに手番が入れ替わっている）
        let sign = (!pos.side_to_move()).sign();
        let mut diff = 0;
        if mv.is_promotion() {
            let moved = pos.piece_on(mv.to());
            diff += PROMOTION_SCORES[moved.piece_type().unpromote().index()];
        }
        if !captured.is_empty() {
            diff += EXCHANGE_SCORES[captured.piece_type().index()];
        }
        prev + sign * diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionRecord;
    use crate::types::Square;

    #[test]
    fn test_material_ordering() {
        assert!(PAWN < LANCE && LANCE < KNIGHT && KNIGHT < SILVER);
        assert!(SILVER < GOLD && GOLD < BISHOP && BISHOP < ROOK);
        for v in [TOKIN, PRO_LANCE, PRO_KNIGHT, PRO_SILVER] {
            assert!(v > SILVER && v < BISHOP);
        }
        assert!(HORSE > BISHOP);
        assert!(DRAGON > ROOK);
    }

    #[test]
    fn test_exchange_and_promotion_scores() {
        assert_eq!(exchange_score(PieceType::PAWN).raw(), PAWN * 2);
        assert_eq!(exchange_score(PieceType::HORSE).raw(), HORSE + BISHOP);
        assert_eq!(exchange_score(PieceType::KING), Score::MATERIAL_INFINITY);
        assert_eq!(promotion_score(PieceType::ROOK).raw(), DRAGON - ROOK);
        assert_eq!(promotion_score(PieceType::GOLD), Score::ZERO);
        assert_eq!(promotion_score(PieceType::DRAGON), Score::ZERO);
        assert_eq!(score(PieceType::KING), Score::MATERIAL_INFINITY);
    }

    #[test]
    fn test_symmetric_positions_score_zero() {
        let eval = MaterialEvaluator::new();
        assert_eq!(eval.evaluate_material(&Position::initial()), Score::ZERO);

        let mut record = PositionRecord::empty(Color::Black);
        record.put(Square::new(5, 9), Piece::new(Color::Black, PieceType::KING));
        record.put(Square::new(5, 1), Piece::new(Color::White, PieceType::KING));
        for c in Color::ALL {
            for pt in PieceType::HAND {
                record.hands[c.index()].set(pt, 1);
            }
            record.hands[c.index()].set(PieceType::PAWN, 2);
        }
        let pos = Position::from_record(&record).unwrap();
        assert_eq!(eval.evaluate_material(&pos), Score::ZERO);
    }

    #[test]
    fn test_diff_matches_full_evaluation() {
        let eval = MaterialEvaluator::new();
        let mut pos = Position::initial();
        let mut score = eval.evaluate_material(&pos);
        let sq = Square::new;
        let moves = [
            Move::new(sq(7, 7), sq(7, 6), false),
            Move::new(sq(3, 3), sq(3, 4), false),
            Move::new(sq(8, 8), sq(2, 2), true),
        ];
        for mv in moves {
            let captured = pos.do_move(mv).unwrap();
            score = eval.evaluate_diff(score, &pos, mv, captured);
            assert_eq!(score, eval.evaluate_material(&pos), "{mv}");
        }
        // 角を取って馬に成った
        assert_eq!(score.raw(), BISHOP + HORSE);

        let mv = Move::new(sq(3, 1), sq(2, 2), false);
        let captured = pos.do_move(mv).unwrap();
        score = eval.evaluate_diff(score, &pos, mv, captured);
        assert_eq!(score, Score::ZERO);
        assert_eq!(score, eval.evaluate_material(&pos));
    }
}
