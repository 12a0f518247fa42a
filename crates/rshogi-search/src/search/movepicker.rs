//! 指し手オーダリング（MovePicker）
//!
//! 通常の探索では段階的に指し手を生成して返す。
//!
//! 1. ハッシュの指し手
//! 2. SEEが0以上の駒取り・成り（SEEの高い順）
//! 3. キラー手
//! 4. 静かな手（Historyの成功率の高い順）
//! 5. SEEが負の駒取り・成り
//!
//! 王手がかかっている局面では合法な回避手をすべて生成し、
//! ハッシュの指し手を先頭にしてSEEの高い順に返す。
//! 静止探索ではSEEが0以上の駒取り・成りだけを返す。

use super::history::{History, moved_piece_type};
use crate::movegen::{MoveList, generate_captures, generate_evasions, generate_not_captures};
use crate::position::Position;
use crate::see;
use crate::types::Move;

/// 生成の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    HashMove,
    CapturesInit,
    GoodCaptures,
    Killers,
    QuietsInit,
    Quiets,
    BadCaptures,
    EvasionsInit,
    Evasions,
    QuiesInit,
    QuiesCaptures,
    End,
}

/// 指し手オーダリング
///
/// ノードスタックに置いて使い回すため、`init_*` で初期化する。
pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    killer_index: usize,
    captures: MoveList,
    quiets: MoveList,
    cursor: usize,
    /// SEEが負の駒取りの開始位置
    bad_begin: usize,
    /// 静止探索で小さな駒取りを除くか
    exclude_small_captures: bool,
}

impl MovePicker {
    pub fn new() -> Self {
        MovePicker {
            stage: Stage::End,
            tt_move: Move::NONE,
            killers: [Move::NONE; 2],
            killer_index: 0,
            captures: MoveList::new(),
            quiets: MoveList::new(),
            cursor: 0,
            bad_begin: 0,
            exclude_small_captures: false,
        }
    }

    fn reset(&mut self, stage: Stage, tt_move: Move, killers: [Move; 2]) {
        self.stage = stage;
        self.tt_move = tt_move.without_ext();
        self.killers = killers;
        self.killer_index = 0;
        self.captures.clear();
        self.quiets.clear();
        self.cursor = 0;
        self.bad_begin = 0;
        self.exclude_small_captures = false;
    }

    /// 通常の探索用に初期化する
    pub fn init_main(&mut self, tt_move: Move, killers: [Move; 2], in_check: bool) {
        let stage = if in_check { Stage::EvasionsInit } else { Stage::HashMove };
        self.reset(stage, tt_move, killers);
    }

    /// 静止探索用に初期化する
    pub fn init_quies(&mut self, in_check: bool, exclude_small_captures: bool) {
        let stage = if in_check { Stage::EvasionsInit } else { Stage::QuiesInit };
        self.reset(stage, Move::NONE, [Move::NONE; 2]);
        self.exclude_small_captures = exclude_small_captures;
    }

    /// ハッシュの指し手かキラー手か
    #[inline]
    pub fn is_prior_move(&self, mv: Move) -> bool {
        mv == self.tt_move || self.killers.contains(&mv)
    }

    /// 王手回避の段階で、合法な回避手の数
    #[inline]
    pub fn evasion_count(&self) -> Option<usize> {
        matches!(self.stage, Stage::Evasions).then_some(self.captures.len())
    }

    /// 次の指し手
    ///
    /// 回避手以外は擬似合法手なので、自玉の安全は `do_move` で確かめる。
    pub fn next(&mut self, pos: &mut Position, history: &History) -> Option<Move> {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::CapturesInit;
                    if self.tt_move.is_some() && pos.validate_move(self.tt_move) {
                        return Some(self.tt_move);
                    }
                }
                Stage::CapturesInit => {
                    generate_captures(pos, &mut self.captures);
                    let tt_move = self.tt_move;
                    self.captures.retain(|mv| *mv != tt_move);
                    see::sort_moves(pos, &mut self.captures, false);
                    self.bad_begin = self
                        .captures
                        .iter()
                        .position(|mv| mv.ext_score() < 0)
                        .unwrap_or(self.captures.len());
                    self.cursor = 0;
                    self.stage = Stage::GoodCaptures;
                }
                Stage::GoodCaptures => {
                    if self.cursor < self.bad_begin {
                        self.cursor += 1;
                        return Some(self.captures[self.cursor - 1]);
                    }
                    self.stage = Stage::Killers;
                }
                Stage::Killers => {
                    while self.killer_index < self.killers.len() {
                        let killer = self.killers[self.killer_index];
                        self.killer_index += 1;
                        if killer.is_some()
                            && killer != self.tt_move
                            && !killer.is_promotion()
                            && pos.piece_on(killer.to()).is_empty()
                            && pos.validate_move(killer)
                        {
                            return Some(killer);
                        }
                    }
                    self.stage = Stage::QuietsInit;
                }
                Stage::QuietsInit => {
                    generate_not_captures(pos, &mut self.quiets);
                    let (tt_move, killers) = (self.tt_move, self.killers);
                    self.quiets.retain(|mv| *mv != tt_move && !killers.contains(mv));
                    let turn = pos.side_to_move();
                    for mv in self.quiets.iter_mut() {
                        let ratio = history.ratio(turn, moved_piece_type(pos, *mv), *mv);
                        mv.set_ext_score(ratio as i16);
                    }
                    self.quiets.sort_by_key(|mv| std::cmp::Reverse(mv.ext_score()));
                    self.cursor = 0;
                    self.stage = Stage::Quiets;
                }
                Stage::Quiets => {
                    if self.cursor < self.quiets.len() {
                        self.cursor += 1;
                        return Some(self.quiets[self.cursor - 1]);
                    }
                    self.cursor = self.bad_begin;
                    self.stage = Stage::BadCaptures;
                }
                Stage::BadCaptures => {
                    if self.cursor < self.captures.len() {
                        self.cursor += 1;
                        return Some(self.captures[self.cursor - 1]);
                    }
                    self.stage = Stage::End;
                }
                Stage::EvasionsInit => {
                    let mut pseudo = MoveList::new();
                    generate_evasions(pos, &mut pseudo);
                    for mv in pseudo {
                        if let Some(captured) = pos.do_move(mv) {
                            pos.undo_move(mv, captured);
                            self.captures.push(mv);
                        }
                    }
                    see::sort_moves(pos, &mut self.captures, false);
                    if let Some(i) = self.captures.iter().position(|mv| *mv == self.tt_move) {
                        self.captures[..=i].rotate_right(1);
                    }
                    self.cursor = 0;
                    self.stage = Stage::Evasions;
                }
                Stage::Evasions => {
                    if self.cursor < self.captures.len() {
                        self.cursor += 1;
                        return Some(self.captures[self.cursor - 1]);
                    }
                    return None;
                }
                Stage::QuiesInit => {
                    generate_captures(pos, &mut self.captures);
                    see::sort_moves(pos, &mut self.captures, self.exclude_small_captures);
                    let good = self
                        .captures
                        .iter()
                        .position(|mv| mv.ext_score() < 0)
                        .unwrap_or(self.captures.len());
                    self.captures.truncate(good);
                    self.cursor = 0;
                    self.stage = Stage::QuiesCaptures;
                }
                Stage::QuiesCaptures => {
                    if self.cursor < self.captures.len() {
                        self.cursor += 1;
                        return Some(self.captures[self.cursor - 1]);
                    }
                    self.stage = Stage::End;
                }
                Stage::End => return None,
            }
        }
    }
}

impl Default for MovePicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::generate_all;
    use crate::position::PositionRecord;
    use crate::types::{Color, Piece, PieceType, Square};
    use std::collections::HashSet;

    fn sq(file: u8, rank: u8) -> Square {
        Square::new(file, rank)
    }

    fn collect(picker: &mut MovePicker, pos: &mut Position, history: &History) -> Vec<Move> {
        let mut moves = Vec::new();
        while let Some(mv) = picker.next(pos, history) {
            moves.push(mv);
        }
        moves
    }

    /// 先手の銀が後手の歩と金を取れる局面
    fn fixture() -> Position {
        let mut r = PositionRecord::empty(Color::Black);
        r.put(sq(5, 9), Piece::new(Color::Black, PieceType::KING));
        r.put(sq(5, 1), Piece::new(Color::White, PieceType::KING));
        r.put(sq(5, 5), Piece::new(Color::Black, PieceType::SILVER));
        r.put(sq(5, 4), Piece::new(Color::White, PieceType::PAWN));
        r.put(sq(4, 4), Piece::new(Color::White, PieceType::GOLD));
        r.put(sq(4, 3), Piece::new(Color::White, PieceType::SILVER));
        r.put(sq(2, 7), Piece::new(Color::Black, PieceType::PAWN));
        r.hands[Color::Black.index()].set(PieceType::PAWN, 1);
        Position::from_record(&r).unwrap()
    }

    #[test]
    fn test_main_yields_every_move_once() {
        let mut pos = fixture();
        let history = History::new();
        let tt_move = Move::new(sq(2, 7), sq(2, 6), false);
        let killer = Move::new(sq(5, 5), sq(6, 6), false);
        let mut picker = MovePicker::new();
        picker.init_main(tt_move, [killer, Move::NONE], false);
        let moves = collect(&mut picker, &mut pos, &history);

        assert_eq!(moves[0], tt_move);
        let killer_at = moves.iter().position(|m| *m == killer).unwrap();
        assert!(moves[1..killer_at].iter().all(|m| m.ext_score() >= 0));

        let mut all = MoveList::new();
        generate_all(&pos, &mut all);
        let expected: HashSet<Move> = all.into_iter().collect();
        let got: HashSet<Move> = moves.iter().copied().collect();
        assert_eq!(moves.len(), got.len());
        assert_eq!(got, expected);
        assert!(picker.is_prior_move(tt_move));
        assert!(picker.is_prior_move(killer));
    }

    #[test]
    fn test_bad_captures_come_last() {
        let mut pos = fixture();
        let history = History::new();
        let mut picker = MovePicker::new();
        picker.init_main(Move::NONE, [Move::NONE; 2], false);
        let moves = collect(&mut picker, &mut pos, &history);
        // 5四の歩は4三の銀に取り返される
        let bad = Move::new(sq(5, 5), sq(5, 4), false);
        assert_eq!(moves.last().copied(), Some(bad));
        assert!(moves.last().unwrap().ext_score() < 0);
        assert_eq!(moves[0], Move::new(sq(5, 5), sq(4, 4), false));
    }

    #[test]
    fn test_invalid_tt_move_is_skipped() {
        let mut pos = fixture();
        let history = History::new();
        let mut picker = MovePicker::new();
        // 2七に角はいない
        let tt_move = Move::new(sq(8, 8), sq(2, 2), false);
        picker.init_main(tt_move, [Move::NONE; 2], false);
        let moves = collect(&mut picker, &mut pos, &history);
        assert!(!moves.contains(&tt_move));
    }

    #[test]
    fn test_quies_yields_good_captures_only() {
        let mut pos = fixture();
        let history = History::new();
        let mut picker = MovePicker::new();
        picker.init_quies(false, false);
        let moves = collect(&mut picker, &mut pos, &history);
        assert_eq!(moves, vec![Move::new(sq(5, 5), sq(4, 4), false)]);
    }

    #[test]
    fn test_evasions_are_legal_and_hash_move_first() {
        let mut r = PositionRecord::empty(Color::Black);
        r.put(sq(5, 9), Piece::new(Color::Black, PieceType::KING));
        r.put(sq(5, 1), Piece::new(Color::White, PieceType::KING));
        r.put(sq(5, 5), Piece::new(Color::White, PieceType::ROOK));
        r.put(sq(4, 9), Piece::new(Color::Black, PieceType::GOLD));
        let mut pos = Position::from_record(&r).unwrap();
        assert!(pos.in_check());

        let history = History::new();
        let tt_move = Move::new(sq(5, 9), sq(6, 8), false);
        let mut picker = MovePicker::new();
        picker.init_main(tt_move, [Move::NONE; 2], true);
        let moves = collect(&mut picker, &mut pos, &history);
        assert_eq!(moves[0], tt_move);
        let mut legal = MoveList::new();
        crate::movegen::generate_legal(&mut pos, &mut legal);
        assert_eq!(moves.len(), legal.len());
        assert_eq!(picker.evasion_count(), Some(legal.len()));
    }
}
