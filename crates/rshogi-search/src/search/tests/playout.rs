//! ランダムな局面からの探索のテスト

use proptest::prelude::*;

use super::{legal_moves, test_config};
use crate::position::Position;
use crate::search::Searcher;

/// 初期局面から合法手を選んで進める（指せなくなったら止める）
fn playout(choices: &[usize]) -> Position {
    let mut pos = Position::initial();
    for &i in choices {
        let moves = legal_moves(&pos);
        if moves.is_empty() {
            break;
        }
        let mv = moves[i % moves.len()];
        pos.do_move(mv).expect("legal move rejected");
    }
    pos
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_search_returns_legal_move(choices in prop::collection::vec(any::<usize>(), 0..40)) {
        let pos = playout(&choices);
        let before = pos.clone();
        let legal = legal_moves(&pos);
        let mut searcher = Searcher::new(test_config()).unwrap();

        let result = searcher.search(&pos, 2, None);
        prop_assert_eq!(result.is_resign(), legal.is_empty());
        if !legal.is_empty() {
            prop_assert!(legal.contains(&result.mv), "{} not legal in\n{}", result.mv, pos);
        }

        let result = searcher.idsearch(&pos, 2, None);
        prop_assert_eq!(result.is_resign(), legal.is_empty());
        if !legal.is_empty() {
            prop_assert!(legal.contains(&result.mv), "{} not legal in\n{}", result.mv, pos);
        }
        prop_assert_eq!(pos, before);
    }
}
