//! 1手詰め判定
//!
//! 相手玉に王手をかけられる移動先だけに候補を絞り、実際に指して `is_mate` で確かめる。
//! 王手になる升は「相手玉の位置に相手の色の同じ駒を置いたときの利き」として求める。
//! 打ち歩詰めは反則なので歩打ちは試さない。

use crate::bitboard::{Bitboard, between, direction};
use crate::position::{Position, drop_rank_allowed, promotion_options};
use crate::types::{Color, Move, Piece, PieceType, Square};

/// colorの駒ptがksqの玉に王手をかけられる升
#[inline]
fn check_squares(pos: &Position, color: Color, pt: PieceType, ksq: Square) -> Bitboard {
    pos.attacks_from(Piece::new(!color, pt), ksq)
}

/// fromの駒が動くと開き王手になり得るか
fn is_discovery_candidate(pos: &Position, us: Color, from: Square, ksq: Square) -> bool {
    let Some(dir) = direction(ksq, from) else {
        return false;
    };
    if (between(ksq, from) & pos.occupied()).is_not_empty() {
        return false;
    }
    pos.first_piece_beyond(from, dir).is_some_and(|sq| {
        let pc = pos.piece_on(sq);
        pc.is_color(us) && Position::is_slider_toward(pc, dir.reverse())
    })
}

fn is_mate_after(pos: &mut Position, mv: Move) -> bool {
    let Some(captured) = pos.do_move(mv) else {
        return false;
    };
    let mate = pos.is_mate();
    pos.undo_move(mv, captured);
    mate
}

/// 手番側に1手詰めがあればその指し手を返す
///
/// 局面は一時的に変更されるが、戻ったときには元の状態になっている。
pub fn mate_1ply(pos: &mut Position) -> Option<Move> {
    let us = pos.side_to_move();
    let ksq = pos.king_square(!us);
    if !ksq.is_valid() {
        return None;
    }
    let own = pos.pieces_c(us);

    let hand = *pos.hand(us);
    if !hand.is_empty() {
        let empties = !pos.occupied();
        for pt in PieceType::HAND {
            if pt == PieceType::PAWN || !hand.has(pt) {
                continue;
            }
            for to in (check_squares(pos, us, pt, ksq) & empties).iter() {
                if !drop_rank_allowed(us, pt, to) {
                    continue;
                }
                let mv = Move::new_drop(pt, to);
                if is_mate_after(pos, mv) {
                    return Some(mv);
                }
            }
        }
    }

    for from in own.iter() {
        let pc = pos.piece_on(from);
        let pt = pc.piece_type();
        let discovered = is_discovery_candidate(pos, us, from, ksq);
        if pt == PieceType::KING && !discovered {
            continue;
        }
        for to in pos.attacks_from(pc, from).and_not(own).iter() {
            let (plain, promote) = promotion_options(us, pt, from, to);
            for (allowed, promotion) in [(promote, true), (plain, false)] {
                if !allowed {
                    continue;
                }
                let moved = if promotion { pt.promote() } else { pt };
                if !discovered && !check_squares(pos, us, moved, ksq).contains(to) {
                    continue;
                }
                let mv = Move::new(from, to, promotion);
                if is_mate_after(pos, mv) {
                    return Some(mv);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{MoveList, generate_legal};
    use crate::position::PositionRecord;

    type Placement = (u8, u8, Color, PieceType);

    fn build(turn: Color, pieces: &[Placement], hands: &[(Color, PieceType, u8)]) -> Position {
        let mut record = PositionRecord::empty(turn);
        for &(file, rank, c, pt) in pieces {
            record.put(Square::new(file, rank), Piece::new(c, pt));
        }
        for &(c, pt, n) in hands {
            record.hands[c.index()].set(pt, n);
        }
        Position::from_record(&record).unwrap()
    }

    /// 合法手をすべて指して詰みを探す
    fn brute_force(pos: &mut Position) -> bool {
        let mut list = MoveList::new();
        generate_legal(pos, &mut list);
        list.into_iter().any(|mv| is_mate_after(pos, mv))
    }

    fn check(mut pos: Position, expected: bool) {
        let before = pos.clone();
        let found = mate_1ply(&mut pos);
        assert_eq!(found.is_some(), expected, "{pos}");
        assert_eq!(pos, before);
        assert_eq!(brute_force(&mut pos), expected, "{pos}");
        if let Some(mv) = found {
            let captured = pos.do_move(mv).unwrap();
            assert!(pos.is_mate());
            pos.undo_move(mv, captured);
        }
    }

    use Color::{Black as B, White as W};
    use PieceType as P;

    #[test]
    fn test_gold_drop_mate() {
        let pos = build(B, &[(5, 1, W, P::KING), (5, 3, B, P::PAWN), (5, 9, B, P::KING)], &[
            (B, P::GOLD, 1),
        ]);
        check(pos, true);
    }

    #[test]
    fn test_gold_drop_mate_for_white() {
        let pos = build(W, &[(5, 1, W, P::KING), (5, 7, W, P::PAWN), (5, 9, B, P::KING)], &[
            (W, P::GOLD, 1),
        ]);
        check(pos, true);
    }

    #[test]
    fn test_silver_drop_mate_and_escape() {
        let walled = build(
            B,
            &[
                (5, 1, W, P::KING),
                (6, 2, W, P::PAWN),
                (4, 2, W, P::PAWN),
                (5, 3, B, P::PAWN),
                (5, 9, B, P::KING),
            ],
            &[(B, P::SILVER, 1)],
        );
        check(walled, true);

        let open = build(B, &[(5, 1, W, P::KING), (5, 3, B, P::PAWN), (5, 9, B, P::KING)], &[
            (B, P::SILVER, 1),
        ]);
        check(open, false);
    }

    #[test]
    fn test_interposed_capture_prevents_mate() {
        let pos = build(
            W,
            &[(5, 1, W, P::KING), (5, 7, W, P::PAWN), (8, 8, B, P::ROOK), (5, 9, B, P::KING)],
            &[(W, P::GOLD, 1), (B, P::PAWN, 1)],
        );
        check(pos, false);
    }

    #[test]
    fn test_knight_drop_mate() {
        let boxed = build(
            B,
            &[
                (2, 1, W, P::KNIGHT),
                (1, 1, W, P::KING),
                (2, 2, W, P::BISHOP),
                (1, 2, W, P::LANCE),
                (5, 9, B, P::KING),
            ],
            &[(B, P::KNIGHT, 1), (W, P::PAWN, 1)],
        );
        check(boxed, true);

        let escape = build(
            B,
            &[
                (2, 1, W, P::KNIGHT),
                (1, 1, W, P::KING),
                (2, 2, W, P::BISHOP),
                (1, 3, W, P::LANCE),
                (5, 9, B, P::KING),
            ],
            &[(B, P::KNIGHT, 1), (W, P::PAWN, 1)],
        );
        check(escape, false);
    }

    #[test]
    fn test_pawn_push_mate_but_not_pawn_drop() {
        let push = build(
            B,
            &[
                (1, 2, W, P::LANCE),
                (1, 3, W, P::KING),
                (2, 5, B, P::DRAGON),
                (1, 5, B, P::PAWN),
                (5, 9, B, P::KING),
            ],
            &[],
        );
        check(push, true);

        let drop = build(
            B,
            &[(1, 2, W, P::LANCE), (1, 3, W, P::KING), (2, 5, B, P::DRAGON), (5, 9, B, P::KING)],
            &[(B, P::PAWN, 1)],
        );
        assert!(drop.is_pawn_drop_mate(Square::new(1, 4)));
        check(drop, false);
    }

    #[test]
    fn test_no_mate_in_initial_position() {
        check(Position::initial(), false);
    }
}
