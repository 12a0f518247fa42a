//! 連続王手の千日手の検出
//!
//! 同一局面の繰り返しまでの手順を遡り、一方が王手をかけ続けていたかを調べる。
//! 王手をかけ続けた側の負け、どちらも王手をかけ続けていなければ引き分け。

use super::RecordHistory;

/// 経路上の1局面
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathEntry {
    /// 局面のハッシュ（手番を含む）
    pub hash: u64,
    /// 手番側が王手をかけられているか
    pub in_check: bool,
}

/// 検出結果（現局面の手番側から見て）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrState {
    None,
    Draw,
    Win,
    Lose,
}

/// 連続王手の千日手検出器
///
/// ルート以前の棋譜は直近の `MAX_LENGTH` 局面だけを持つ。
#[derive(Debug, Clone, Default)]
pub struct ScrDetector {
    /// 新しい順
    history: Vec<PathEntry>,
}

impl ScrDetector {
    pub const MAX_LENGTH: usize = 32;

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// ルート以前の棋譜を登録する
    pub fn register(&mut self, record: &RecordHistory) {
        self.history = record.path.iter().rev().take(Self::MAX_LENGTH).copied().collect();
    }

    /// 探索経路だけを遡り、最初の同一局面で判定する
    ///
    /// `path` はルートから親局面までの並び。
    pub fn detect_short(&self, path: &[PathEntry], hash: u64) -> ScrState {
        scan(path.iter().rev(), hash, 1)
    }

    /// 探索経路と棋譜を遡り、4回目の同一局面で判定する
    pub fn detect(&self, path: &[PathEntry], hash: u64) -> ScrState {
        scan(path.iter().rev().chain(self.history.iter()), hash, 3)
    }
}

fn scan<'a>(entries: impl Iterator<Item = &'a PathEntry>, hash: u64, needed: u32) -> ScrState {
    let mut repetitions = 0;
    let mut is_current_turn = false;
    let mut current_checking = true;
    let mut enemy_checking = true;

    for entry in entries {
        // 相手番の局面で相手が王手されていれば、手番側が王手をかけている
        if is_current_turn {
            enemy_checking &= entry.in_check;
        } else {
            current_checking &= entry.in_check;
        }
        is_current_turn = !is_current_turn;

        if entry.hash == hash {
            repetitions += 1;
            if repetitions == needed {
                return if current_checking {
                    ScrState::Lose
                } else if enemy_checking {
                    ScrState::Win
                } else {
                    ScrState::Draw
                };
            }
        }

        if !current_checking && !enemy_checking {
            return ScrState::Draw;
        }
    }

    ScrState::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use crate::types::{Move, Square};

    const H: u64 = 0x1234_5678_9abc_def0;

    fn entry(hash: u64, in_check: bool) -> PathEntry {
        PathEntry { hash, in_check }
    }

    #[test]
    fn test_detect_short() {
        let scr = ScrDetector::default();
        assert_eq!(scr.detect_short(&[entry(0, false)], H), ScrState::None);
        assert_eq!(scr.detect_short(&[entry(H, false), entry(0, false)], H), ScrState::Draw);
        // 2手前に手番側が王手されていた（相手が王手をかけ続けた）
        assert_eq!(scr.detect_short(&[entry(H, true), entry(0, false)], H), ScrState::Win);
        // 1手前に相手が王手されていた（手番側が王手をかけ続けた）
        assert_eq!(scr.detect_short(&[entry(H, false), entry(0, true)], H), ScrState::Lose);
    }

    #[test]
    fn test_detect_stops_when_neither_side_checks() {
        let scr = ScrDetector::default();
        let path = [entry(H, true), entry(1, true), entry(2, false), entry(3, false)];
        assert_eq!(scr.detect_short(&path, H), ScrState::Draw);
        assert_eq!(scr.detect(&path, H), ScrState::Draw);
    }

    #[test]
    fn test_detect_needs_four_occurrences() {
        let scr = ScrDetector::default();
        // 手番側が王手をかけ続けて同一局面が3回現れた
        let path: Vec<PathEntry> =
            (0..6).map(|i| if i % 2 == 0 { entry(H, false) } else { entry(7, true) }).collect();
        assert_eq!(scr.detect_short(&path, H), ScrState::Lose);
        assert_eq!(scr.detect(&path, H), ScrState::Lose);
        assert_eq!(scr.detect(&path[2..], H), ScrState::None);
    }

    #[test]
    fn test_detect_uses_record() {
        // 初形から 5八玉 5二玉 5九玉 5一玉 で初形に戻る
        let initial = Position::initial();
        let moves = [
            Move::new(Square::new(5, 9), Square::new(5, 8), false),
            Move::new(Square::new(5, 1), Square::new(5, 2), false),
            Move::new(Square::new(5, 8), Square::new(5, 9), false),
            Move::new(Square::new(5, 2), Square::new(5, 1), false),
        ];
        let record = RecordHistory::replay(&initial, &moves).unwrap();
        assert_eq!(record.path.len(), 4);
        assert_eq!(record.path[0].hash, initial.hash());

        let mut scr = ScrDetector::default();
        scr.register(&record);
        // 棋譜を遡ると、どちらも王手をかけていない
        assert_eq!(scr.detect(&[], initial.hash()), ScrState::Draw);
    }
}
