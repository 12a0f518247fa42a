//! 指し手生成器
//!
//! 王手がかかっていない局面では、駒を取る手・成る手（`Captures`）と
//! それ以外の手・駒打ち（`NotCaptures`）の2段階に分けて生成する。
//! 両者は重複せず、合わせると擬似合法手のすべてになる。
//! 王手がかかっている局面では `Evasions` だけを使う。

use crate::bitboard::{Bitboard, FILE_BB, between, king_attacks};
use crate::position::{PieceSet, Position, drop_rank_allowed, promotion_options};
use crate::types::{Color, Move, PieceType};

use super::MoveList;

/// 生成する指し手の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenType {
    /// 駒を取る手と成る手
    Captures,
    /// 駒を取らず成らない手と駒打ち
    NotCaptures,
    /// 王手回避
    Evasions,
}

/// 指定した種類の指し手を生成してlistに追加する
pub fn generate(pos: &Position, gen_type: GenType, list: &mut MoveList) {
    match gen_type {
        GenType::Captures => generate_captures(pos, list),
        GenType::NotCaptures => generate_not_captures(pos, list),
        GenType::Evasions => generate_evasions(pos, list),
    }
}

/// 盤上の駒の移動のうち、移動先がtargetに含まれるものを生成する
///
/// `captures` が真なら取る手と成る手、偽なら取らず成らない手だけを出す。
fn generate_board_moves(pos: &Position, target: Bitboard, captures: bool, list: &mut MoveList) {
    let us = pos.side_to_move();
    let enemies = pos.pieces_c(!us);
    for from in pos.pieces_c(us).iter() {
        let pc = pos.piece_on(from);
        let pt = pc.piece_type();
        for to in (pos.attacks_from(pc, from) & target).iter() {
            let (plain, promote) = promotion_options(us, pt, from, to);
            let capture = enemies.contains(to);
            if captures {
                if promote {
                    list.push(Move::new(from, to, true));
                }
                if plain && capture {
                    list.push(Move::new(from, to, false));
                }
            } else if plain && !capture {
                list.push(Move::new(from, to, false));
            }
        }
    }
}

/// 二歩にならない升
fn pawn_drop_mask(pos: &Position, us: Color) -> Bitboard {
    let pawns = pos.pieces(us, PieceSet::Pawn);
    let mut mask = Bitboard::ALL;
    for file_bb in &FILE_BB {
        if (pawns & *file_bb).is_not_empty() {
            mask = mask.and_not(*file_bb);
        }
    }
    mask
}

/// 駒打ちを生成（移動先はtargetの空き升に限る）
fn generate_drops(pos: &Position, target: Bitboard, list: &mut MoveList) {
    let us = pos.side_to_move();
    let hand = pos.hand(us);
    if hand.is_empty() {
        return;
    }
    let empties = target.and_not(pos.occupied());
    for pt in PieceType::HAND {
        if !hand.has(pt) {
            continue;
        }
        let mut squares = empties;
        if pt == PieceType::PAWN {
            squares &= pawn_drop_mask(pos, us);
        }
        for to in squares.iter() {
            if !drop_rank_allowed(us, pt, to) {
                continue;
            }
            if pt == PieceType::PAWN && pos.is_pawn_drop_mate(to) {
                continue;
            }
            list.push(Move::new_drop(pt, to));
        }
    }
}

/// 駒を取る手・成る手を生成
pub fn generate_captures(pos: &Position, list: &mut MoveList) {
    let target = !pos.pieces_c(pos.side_to_move());
    generate_board_moves(pos, target, true, list);
}

/// 駒を取らず成らない手と駒打ちを生成
pub fn generate_not_captures(pos: &Position, list: &mut MoveList) {
    let empties = !pos.occupied();
    generate_board_moves(pos, empties, false, list);
    generate_drops(pos, empties, list);
}

/// 王手回避手を生成
///
/// 玉の移動はすべての升へ、それ以外は王手している駒を取る手と合駒。
/// 両王手では玉の移動だけ。自玉への王手放置は `do_move` が弾く。
pub fn generate_evasions(pos: &Position, list: &mut MoveList) {
    let us = pos.side_to_move();
    let ksq = pos.king_square(us);
    let own = pos.pieces_c(us);

    let state = pos.check_state();
    if !state.is_double()
        && let Some(&checker) = state.checkers().first()
    {
        let shield = between(checker, ksq);
        let target = shield | Bitboard::from_square(checker);
        for from in own.iter() {
            if from == ksq {
                continue;
            }
            let pc = pos.piece_on(from);
            for to in (pos.attacks_from(pc, from) & target).iter() {
                let (plain, promote) = promotion_options(us, pc.piece_type(), from, to);
                if promote {
                    list.push(Move::new(from, to, true));
                }
                if plain {
                    list.push(Move::new(from, to, false));
                }
            }
        }
        if shield.is_not_empty() {
            generate_drops(pos, shield, list);
        }
    }

    for to in king_attacks(ksq).and_not(own).iter() {
        list.push(Move::new(ksq, to, false));
    }
}

/// 擬似合法手をすべて生成（王手がかかっていれば回避手）
pub fn generate_all(pos: &Position, list: &mut MoveList) {
    if pos.in_check() {
        generate_evasions(pos, list);
    } else {
        generate_captures(pos, list);
        generate_not_captures(pos, list);
    }
}

/// 合法手をすべて生成（`do_move` で自玉が取られないことを確かめる）
pub fn generate_legal(pos: &mut Position, list: &mut MoveList) {
    let mut pseudo = MoveList::new();
    generate_all(pos, &mut pseudo);
    for mv in pseudo {
        if let Some(captured) = pos.do_move(mv) {
            pos.undo_move(mv, captured);
            list.push(mv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionRecord;
    use crate::types::{Piece, Square};
    use std::collections::HashSet;

    fn sq(file: u8, rank: u8) -> Square {
        Square::new(file, rank)
    }

    /// validate_moveで全候補を総当たりした擬似合法手
    fn brute_force(pos: &Position) -> HashSet<u32> {
        let mut set = HashSet::new();
        for from in Square::all() {
            for to in Square::all() {
                for promote in [false, true] {
                    let mv = Move::new(from, to, promote);
                    if pos.validate_move(mv) {
                        set.insert(mv.serialize());
                    }
                }
            }
        }
        for pt in PieceType::HAND {
            for to in Square::all() {
                let mv = Move::new_drop(pt, to);
                if pos.validate_move(mv) {
                    set.insert(mv.serialize());
                }
            }
        }
        set
    }

    fn assert_partition(pos: &Position) {
        let mut captures = MoveList::new();
        let mut quiets = MoveList::new();
        generate_captures(pos, &mut captures);
        generate_not_captures(pos, &mut quiets);
        let mut all = HashSet::new();
        for mv in captures.iter().chain(quiets.iter()) {
            assert!(all.insert(mv.serialize()), "duplicate {mv}");
        }
        assert_eq!(all, brute_force(pos));
        let enemies = pos.pieces_c(!pos.side_to_move());
        for mv in &quiets {
            assert!(!mv.is_promotion());
            assert!(!enemies.contains(mv.to()));
        }
        for mv in &captures {
            assert!(mv.is_promotion() || enemies.contains(mv.to()), "{mv}");
        }
    }

    #[test]
    fn test_initial_position_moves() {
        let mut pos = Position::initial();
        let mut list = MoveList::new();
        generate_legal(&mut pos, &mut list);
        assert_eq!(list.len(), 30);
        let mut captures = MoveList::new();
        generate_captures(&pos, &mut captures);
        assert!(captures.is_empty());
        assert_partition(&pos);
    }

    #[test]
    fn test_partition_after_opening() {
        let mut pos = Position::initial();
        for mv in [
            Move::new(sq(7, 7), sq(7, 6), false),
            Move::new(sq(3, 3), sq(3, 4), false),
            Move::new(sq(8, 8), sq(2, 2), true),
            Move::new(sq(3, 1), sq(2, 2), false),
        ] {
            pos.do_move(mv).unwrap();
        }
        // 先手は角を持っている
        assert!(pos.hand(Color::Black).has(PieceType::BISHOP));
        assert_partition(&pos);
    }

    #[test]
    fn test_promotion_options_in_generation() {
        let mut record = PositionRecord::empty(Color::Black);
        record.put(sq(5, 9), Piece::new(Color::Black, PieceType::KING));
        record.put(sq(9, 1), Piece::new(Color::White, PieceType::KING));
        record.put(sq(2, 4), Piece::new(Color::Black, PieceType::PAWN));
        record.put(sq(4, 4), Piece::new(Color::Black, PieceType::SILVER));
        record.put(sq(6, 5), Piece::new(Color::Black, PieceType::KNIGHT));
        let pos = Position::from_record(&record).unwrap();
        let mut captures = MoveList::new();
        generate_captures(&pos, &mut captures);
        // 歩は成りのみ
        assert!(captures.contains(&Move::new(sq(2, 4), sq(2, 3), true)));
        let mut quiets = MoveList::new();
        generate_not_captures(&pos, &mut quiets);
        assert!(!quiets.contains(&Move::new(sq(2, 4), sq(2, 3), false)));
        // 銀は成・不成の両方
        assert!(captures.contains(&Move::new(sq(4, 4), sq(4, 3), true)));
        assert!(quiets.contains(&Move::new(sq(4, 4), sq(4, 3), false)));
        // 桂は3段目なら両方
        assert!(captures.contains(&Move::new(sq(6, 5), sq(7, 3), true)));
        assert!(quiets.contains(&Move::new(sq(6, 5), sq(7, 3), false)));
        assert_partition(&pos);
    }

    #[test]
    fn test_evasions() {
        // 後手の飛車で王手、合駒と玉の移動
        let mut record = PositionRecord::empty(Color::Black);
        record.put(sq(5, 9), Piece::new(Color::Black, PieceType::KING));
        record.put(sq(5, 1), Piece::new(Color::White, PieceType::ROOK));
        record.put(sq(9, 1), Piece::new(Color::White, PieceType::KING));
        record.put(sq(4, 8), Piece::new(Color::Black, PieceType::GOLD));
        record.hands[Color::Black.index()].set(PieceType::SILVER, 1);
        let mut pos = Position::from_record(&record).unwrap();
        assert!(pos.in_check());
        let mut list = MoveList::new();
        generate_evasions(&pos, &mut list);
        // 合駒（5二〜5八の7升）
        let drops = list.iter().filter(|mv| mv.is_drop()).count();
        assert_eq!(drops, 7);
        assert!(list.contains(&Move::new(sq(4, 8), sq(5, 8), false)));
        assert!(list.contains(&Move::new(sq(5, 9), sq(6, 8), false)));
        let mut legal = MoveList::new();
        generate_legal(&mut pos, &mut legal);
        assert!(!legal.contains(&Move::new(sq(5, 9), sq(5, 8), false)));
        assert!(legal.contains(&Move::new(sq(5, 9), sq(6, 9), false)));
    }
}
