//! 棋譜を使った千日手の検出のテスト

use super::{build, init_logger, is_legal, test_config};
use crate::position::Position;
use crate::search::Searcher;
use crate::shek::RecordError;
use crate::types::{Color, Move, PieceType, Score, Square};

use Color::{Black as B, White as W};
use PieceType as P;

fn mv(from: (u8, u8), to: (u8, u8)) -> Move {
    Move::new(Square::new(from.0, from.1), Square::new(to.0, to.1), false)
}

/// 棋譜を最後まで進めた局面
fn replay(initial: &Position, moves: &[Move]) -> Position {
    let mut pos = initial.clone();
    for &m in moves {
        assert!(pos.validate_move(m), "{m}");
        assert!(pos.do_move(m).is_some(), "{m}");
    }
    pos
}

fn shuffle_rooks(times: usize) -> Vec<Move> {
    let cycle = [mv((2, 8), (3, 8)), mv((8, 2), (7, 2)), mv((3, 8), (2, 8)), mv((7, 2), (8, 2))];
    cycle.iter().copied().cycle().take(cycle.len() * times).collect()
}

#[test]
fn test_record_repetition_is_cut() -> anyhow::Result<()> {
    init_logger();
    let initial = Position::initial();
    let mut searcher = Searcher::new(test_config())?;

    // 棋譜なしでは1手の探索で同一局面は現れない
    let result = searcher.idsearch(&initial, 1, None);
    assert_eq!(result.info.shek_cut, 0);

    // 飛車の往復を3回繰り返した後の初期局面
    searcher.set_record(&initial, &shuffle_rooks(3))?;
    let result = searcher.idsearch(&initial, 1, None);
    assert!(result.info.shek_cut > 0);
    assert!(is_legal(&initial, result.mv));

    searcher.clear_record();
    let result = searcher.idsearch(&initial, 1, None);
    assert_eq!(result.info.shek_cut, 0);
    Ok(())
}

#[test]
fn test_repetition_search_keeps_legal_moves() -> anyhow::Result<()> {
    let initial = Position::initial();
    let mut searcher = Searcher::new(test_config())?;
    searcher.set_record(&initial, &shuffle_rooks(2))?;
    let result = searcher.idsearch(&initial, 4, None);
    assert!(is_legal(&initial, result.mv));
    Ok(())
}

#[test]
fn test_set_record_rejects_illegal_move() -> anyhow::Result<()> {
    let initial = Position::initial();
    let mut searcher = Searcher::new(test_config())?;
    let mut moves = shuffle_rooks(1);
    // 2七には先手の歩がある
    moves.push(Move::new(Square::new(2, 8), Square::new(2, 7), false));
    let err = searcher.set_record(&initial, &moves).unwrap_err();
    assert_eq!(err, RecordError::IllegalMove { ordinal: 5, mv: moves[4] });
    Ok(())
}

#[test]
fn test_repetition_with_extra_piece_in_hand_is_win() -> anyhow::Result<()> {
    init_logger();
    // 後手が打った歩を先手が取り、玉の三角移動で手番を合わせて同じ盤面に戻す
    let initial = build(
        W,
        &[(5, 9, B, P::KING), (2, 8, B, P::ROOK), (5, 1, W, P::KING)],
        &[(W, P::PAWN, 1)],
    )?;
    let moves = [
        Move::new_drop(P::PAWN, Square::new(2, 5)),
        mv((2, 8), (2, 5)),
        mv((5, 1), (5, 2)),
        mv((5, 9), (5, 8)),
        mv((5, 2), (5, 1)),
        mv((5, 8), (4, 9)),
        mv((5, 1), (5, 2)),
        mv((2, 5), (2, 8)),
        mv((5, 2), (5, 1)),
    ];
    let root = replay(&initial, &moves);
    let mut searcher = Searcher::new(test_config())?;

    let result = searcher.idsearch(&root, 1, None);
    assert!(!result.score.is_mate());

    // 4九玉→5九玉で、歩を1枚多く持って後手番の初めの盤面になる
    searcher.set_record(&initial, &moves)?;
    let result = searcher.idsearch(&root, 1, None);
    assert_eq!(result.mv, mv((4, 9), (5, 9)));
    assert_eq!(result.score, Score::mate_in(1));
    assert!(result.info.shek_cut > 0);
    Ok(())
}

#[test]
fn test_perpetual_check_loses_for_checking_side() -> anyhow::Result<()> {
    init_logger();
    // 先手の飛車が2筋と1筋から王手をかけ続ける
    let initial = build(B, &[(5, 9, B, P::KING), (2, 5, B, P::ROOK), (1, 1, W, P::KING)], &[])?;
    let cycle = [mv((2, 5), (1, 5)), mv((1, 1), (2, 1)), mv((1, 5), (2, 5)), mv((2, 1), (1, 1))];
    let moves: Vec<Move> = cycle.iter().copied().cycle().take(cycle.len() * 3 - 1).collect();
    let root = replay(&initial, &moves);
    assert!(root.in_check());

    let mut searcher = Searcher::new(test_config())?;
    searcher.set_record(&initial, &moves)?;
    // 2一玉→1一玉で4回目の同一局面になり、王手をかけ続けた先手の負け
    let result = searcher.idsearch(&root, 1, None);
    assert_eq!(result.mv, mv((2, 1), (1, 1)));
    assert_eq!(result.score, Score::mate_in(1));
    Ok(())
}

#[test]
fn test_fourfold_repetition_without_check_is_draw() -> anyhow::Result<()> {
    // 飛車1枚損の後手は千日手を選ぶ
    let initial = build(B, &[(5, 9, B, P::KING), (2, 8, B, P::ROOK), (5, 1, W, P::KING)], &[])?;
    let cycle = [mv((2, 8), (3, 8)), mv((5, 1), (5, 2)), mv((3, 8), (2, 8)), mv((5, 2), (5, 1))];
    let moves: Vec<Move> = cycle.iter().copied().cycle().take(cycle.len() * 3 - 1).collect();
    let root = replay(&initial, &moves);

    let mut searcher = Searcher::new(test_config())?;
    let result = searcher.idsearch(&root, 1, None);
    assert!(result.score < Score::ZERO);

    searcher.set_record(&initial, &moves)?;
    let result = searcher.idsearch(&root, 1, None);
    assert_eq!(result.mv, mv((5, 2), (5, 1)));
    assert_eq!(result.score, Score::ZERO);
    Ok(())
}
