//! History統計
//!
//! 試した回数（appear）と最善手になった回数（good）を指し手ごとに数え、
//! 成功率を静かな手の並べ替えとLMRに使う。
//!
//! - from_to: [Color][from][to]（fromは81升 + 7種の駒打ち）
//! - piece_to: [Color][成った後の駒種][to]

use crate::position::Position;
use crate::types::{Color, Move, PieceType, Square};

/// from_toのfromの数（81升 + 7種の駒打ち）
const FROM_NUM: usize = Square::NUM + PieceType::HAND_NUM;

const FROM_TO_SIZE: usize = Color::NUM * FROM_NUM * Square::NUM;
const PIECE_TO_SIZE: usize = Color::NUM * PieceType::NUM * Square::NUM;

/// カウンタがこれを超えたら半分にする
const COUNT_LIMIT: u64 = 1 << 28;

const GOOD_SHIFT: u32 = 32;
const APPEAR_MASK: u64 = 0xffff_ffff;

/// appear（下位32bit）と good（上位32bit）の組
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counter(u64);

impl Counter {
    #[inline]
    fn appear(self) -> u64 {
        self.0 & APPEAR_MASK
    }

    #[inline]
    fn good(self) -> u64 {
        self.0 >> GOOD_SHIFT
    }

    #[inline]
    fn pack(appear: u64, good: u64) -> Counter {
        debug_assert!(good <= appear);
        Counter((good << GOOD_SHIFT) | appear)
    }

    fn add(&mut self, appear: u64, good: u64) {
        let (mut a, mut g) = (self.appear() + appear, self.good() + good);
        if a >= COUNT_LIMIT {
            a /= 2;
            g /= 2;
        }
        *self = Counter::pack(a, g.min(a));
    }

    #[inline]
    fn ratio(self) -> i32 {
        ((self.good() + 1) * History::RATIO_MAX as u64 / (self.appear() + 2)) as i32
    }

    fn halve(&mut self) {
        *self = Counter::pack(self.appear() / 2, self.good() / 2);
    }
}

/// 指した後の駒種（成りを反映）
#[inline]
pub fn moved_piece_type(pos: &Position, mv: Move) -> PieceType {
    if mv.is_drop() {
        return mv.drop_piece_type();
    }
    let pt = pos.piece_on(mv.from()).piece_type();
    if mv.is_promotion() { pt.promote() } else { pt }
}

#[inline]
fn from_to_index(turn: Color, mv: Move) -> usize {
    let from = if mv.is_drop() {
        Square::NUM + mv.drop_piece_type().hand_index()
    } else {
        mv.from().index()
    };
    (turn.index() * FROM_NUM + from) * Square::NUM + mv.to().index()
}

#[inline]
fn piece_to_index(turn: Color, moved: PieceType, mv: Move) -> usize {
    (turn.index() * PieceType::NUM + moved.index()) * Square::NUM + mv.to().index()
}

/// History表
pub struct History {
    from_to: Box<[Counter]>,
    piece_to: Box<[Counter]>,
}

impl History {
    /// `ratio` の最大値
    pub const RATIO_MAX: i32 = 0x2000;

    pub fn new() -> Self {
        Self {
            from_to: vec![Counter::default(); FROM_TO_SIZE].into_boxed_slice(),
            piece_to: vec![Counter::default(); PIECE_TO_SIZE].into_boxed_slice(),
        }
    }

    /// 指し手を数える
    ///
    /// `moved` は `moved_piece_type` で得た指した後の駒種。
    pub fn add(&mut self, turn: Color, moved: PieceType, mv: Move, appear: u32, good: u32) {
        let (appear, good) = (u64::from(appear), u64::from(good));
        self.from_to[from_to_index(turn, mv)].add(appear, good);
        self.piece_to[piece_to_index(turn, moved, mv)].add(appear, good);
    }

    /// 成功率（0..=RATIO_MAX）
    ///
    /// 一度も試していない手は RATIO_MAX / 2。
    pub fn ratio(&self, turn: Color, moved: PieceType, mv: Move) -> i32 {
        let a = self.from_to[from_to_index(turn, mv)].ratio();
        let b = self.piece_to[piece_to_index(turn, moved, mv)].ratio();
        (a + b) / 2
    }

    /// すべてのカウンタを半分にする（探索の開始時）
    pub fn reduce(&mut self) {
        self.from_to.iter_mut().chain(self.piece_to.iter_mut()).for_each(Counter::halve);
    }

    pub fn clear(&mut self) {
        self.from_to.fill(Counter::default());
        self.piece_to.fill(Counter::default());
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: (u8, u8), to: (u8, u8)) -> Move {
        Move::new(Square::new(from.0, from.1), Square::new(to.0, to.1), false)
    }

    #[test]
    fn test_history_ratio_default() {
        let history = History::new();
        let m = mv((7, 7), (7, 6));
        assert_eq!(history.ratio(Color::Black, PieceType::PAWN, m), History::RATIO_MAX / 2);
    }

    #[test]
    fn test_history_good_raises_ratio() {
        let mut history = History::new();
        let good = mv((2, 7), (2, 6));
        let bad = mv((7, 7), (7, 6));
        history.add(Color::Black, PieceType::PAWN, good, 4, 4);
        history.add(Color::Black, PieceType::PAWN, bad, 4, 0);

        let base = History::RATIO_MAX / 2;
        assert!(history.ratio(Color::Black, PieceType::PAWN, good) > base);
        assert!(history.ratio(Color::Black, PieceType::PAWN, bad) < base);
        // 手番ごとに別
        assert_eq!(history.ratio(Color::White, PieceType::PAWN, good), base);
        assert!(history.ratio(Color::Black, PieceType::PAWN, good) <= History::RATIO_MAX);
    }

    #[test]
    fn test_history_drops_and_moves_are_separate() {
        let mut history = History::new();
        let drop = Move::new_drop(PieceType::GOLD, Square::new(5, 2));
        let board = mv((4, 1), (5, 2));
        history.add(Color::White, PieceType::GOLD, drop, 8, 8);
        assert_ne!(from_to_index(Color::White, drop), from_to_index(Color::White, board));
        // piece_toは駒種と移動先で共有される
        assert!(history.ratio(Color::White, PieceType::GOLD, board) > History::RATIO_MAX / 2);
        assert!(
            history.ratio(Color::White, PieceType::GOLD, drop)
                > history.ratio(Color::White, PieceType::GOLD, board)
        );
    }

    #[test]
    fn test_history_reduce_and_clear() {
        let mut history = History::new();
        let m = mv((2, 7), (2, 6));
        history.add(Color::Black, PieceType::PAWN, m, 6, 3);
        let i = from_to_index(Color::Black, m);
        assert_eq!(history.from_to[i], Counter::pack(6, 3));
        history.reduce();
        assert_eq!(history.from_to[i], Counter::pack(3, 1));
        history.clear();
        assert_eq!(history.ratio(Color::Black, PieceType::PAWN, m), History::RATIO_MAX / 2);
    }

    #[test]
    fn test_counter_halves_on_overflow() {
        let mut c = Counter::pack(COUNT_LIMIT - 1, 10);
        c.add(2, 2);
        assert_eq!(c.appear(), (COUNT_LIMIT + 1) / 2);
        assert_eq!(c.good(), 6);
    }

    #[test]
    fn test_moved_piece_type() {
        let pos = Position::initial();
        assert_eq!(moved_piece_type(&pos, mv((7, 7), (7, 6))), PieceType::PAWN);
        let drop = Move::new_drop(PieceType::SILVER, Square::new(5, 5));
        assert_eq!(moved_piece_type(&pos, drop), PieceType::SILVER);
    }
}
