//! 静的駒交換評価（SEE）
//!
//! 移動先の升に利いている駒を両陣営について集め、安い駒から順に取り合ったときの
//! 駒得を求める。取り合いはどちらの側もいつでも打ち切れるものとし、
//! alpha-beta の窓で結論の変わらない取り合いを打ち切る。
//! ピンは考慮しない。

use smallvec::SmallVec;

use crate::bitboard::{Bitboard, direction};
use crate::eval::material::{exchange_score, promotion_score};
use crate::movegen::MoveList;
use crate::position::Position;
use crate::types::{Color, Move, PieceType, Score, Square};

/// 取り合いに参加する駒
#[derive(Debug, Clone, Copy)]
struct Attacker {
    sq: Square,
    /// 並べ替えの基準（成る前の交換値）
    order: i32,
    /// 移動先で取られたときの交換値
    value: i32,
    /// 移動先で成ったときの加点
    promotion: i32,
}

type Attackers = SmallVec<[Attacker; 16]>;

struct Exchange<'a> {
    pos: &'a Position,
    to: Square,
    occ: Bitboard,
    attackers: [Attackers; Color::NUM],
}

impl<'a> Exchange<'a> {
    fn new(pos: &'a Position, from: Option<Square>, to: Square) -> Self {
        let mut ex = Exchange {
            pos,
            to,
            occ: pos.occupied(),
            attackers: [Attackers::new(), Attackers::new()],
        };
        for c in Color::ALL {
            for sq in pos.attackers_to(c, to).iter() {
                if Some(sq) != from {
                    ex.push(c, sq);
                }
            }
        }
        if let Some(from) = from {
            ex.remove(from);
        }
        ex
    }

    fn push(&mut self, c: Color, sq: Square) {
        let pt = self.pos.piece_on(sq).piece_type();
        let order = exchange_score(pt).raw();
        let (value, promotion) =
            if pt.can_promote() && (sq.is_promotion_zone(c) || self.to.is_promotion_zone(c)) {
                (exchange_score(pt.promote()).raw(), promotion_score(pt).raw())
            } else {
                (order, 0)
            };
        self.attackers[c.index()].push(Attacker { sq, order, value, promotion });
    }

    /// sqの駒を取り除き、その後ろに隠れていた遠方駒を加える
    fn remove(&mut self, sq: Square) {
        self.occ.clear(sq);
        let Some(dir) = direction(self.to, sq) else {
            return;
        };
        let (df, dr) = dir.delta();
        let mut cur = sq;
        while let Some(next) = cur.offset(df, dr) {
            if self.occ.contains(next) {
                let pc = self.pos.piece_on(next);
                if Position::is_slider_toward(pc, dir.reverse()) {
                    self.push(pc.color(), next);
                }
                return;
            }
            cur = next;
        }
    }

    /// 最も安い駒を取り出す
    fn pop(&mut self, c: Color) -> Option<Attacker> {
        let list = &mut self.attackers[c.index()];
        let (index, _) = list.iter().enumerate().min_by_key(|(_, a)| a.order)?;
        let attacker = list.swap_remove(index);
        self.remove(attacker.sq);
        Some(attacker)
    }

    /// cの手番で、価値targetの駒が移動先にあるときの取り合いの結果（cから見た値）
    fn search(&mut self, c: Color, target: i32, alpha: i32, beta: i32) -> i32 {
        // 取らずに打ち切る
        if beta <= 0 {
            return 0;
        }
        let alpha = alpha.max(0);
        let Some(attacker) = self.pop(c) else {
            return alpha;
        };
        let gain = target + attacker.promotion;
        if gain <= alpha {
            return alpha;
        }
        let value = gain - self.search(!c, attacker.value, gain - beta, gain - alpha);
        value.clamp(alpha, beta)
    }
}

/// 指し手の駒交換評価（手番側から見た値）
pub fn see(pos: &Position, mv: Move) -> Score {
    let us = pos.side_to_move();
    let to = mv.to();
    let captured = pos.piece_on(to);
    let mut gain = if captured.is_empty() { 0 } else { exchange_score(captured.piece_type()).raw() };

    let (from, moved) = if mv.is_drop() {
        (None, mv.drop_piece_type())
    } else {
        let from = mv.from();
        let pt = pos.piece_on(from).piece_type();
        if mv.is_promotion() {
            gain += promotion_score(pt).raw();
            (Some(from), pt.promote())
        } else {
            (Some(from), pt)
        }
    };

    let mut ex = Exchange::new(pos, from, to);
    let inf = Score::INFINITY.raw();
    let reply = ex.search(!us, exchange_score(moved).raw(), -inf, inf);
    Score::new(gain - reply)
}

/// 駒交換評価の高い順に並べ替える（評価値は拡張データに入れる）
///
/// `exclude_small_captures` のとき、成らずに歩を取る手と歩以外の駒を取らずに動かす手を除く。
pub fn sort_moves(pos: &Position, moves: &mut MoveList, exclude_small_captures: bool) {
    if exclude_small_captures {
        moves.retain(|mv| {
            let captured = pos.piece_on(mv.to());
            let pawn_capture = !captured.is_empty()
                && captured.piece_type() == PieceType::PAWN
                && !mv.is_promotion();
            let quiet_piece = captured.is_empty()
                && (mv.is_drop() || pos.piece_on(mv.from()).piece_type() != PieceType::PAWN);
            !pawn_capture && !quiet_piece
        });
    }
    for mv in moves.iter_mut() {
        let value = see(pos, *mv).raw();
        mv.set_ext_score(value as i16);
    }
    moves.sort_by_key(|mv| std::cmp::Reverse(mv.ext_score()));
}
