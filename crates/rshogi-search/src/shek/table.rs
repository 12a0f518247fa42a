//! SHEK表
//!
//! 探索中の経路（とルート以前の棋譜）に現れた局面を、盤面ハッシュごとに
//! 先手の手駒・手番・出現回数と一緒に記録する。盤面が同じなら駒の総数も同じなので、
//! 先手の手駒の包含関係だけで両者の優劣が決まる。

use super::{HandSet, ShekState};
use crate::position::Position;
use crate::table::{Bucket, HashTable};
use crate::types::Color;

/// SHEK表の鍵（盤面ハッシュ・先手の手駒・手番）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShekKey {
    pub board_hash: u64,
    pub hand_set: HandSet,
    pub turn: Color,
}

impl ShekKey {
    pub fn of(pos: &Position) -> ShekKey {
        ShekKey {
            board_hash: pos.board_hash(),
            hand_set: HandSet::new(pos.hand(Color::Black)),
            turn: pos.side_to_move(),
        }
    }
}

const COUNT_MASK: u32 = 0x0000_0007;
const MAX_COUNT: u32 = COUNT_MASK;
const TURN_BIT: u32 = 0x0000_0008;
const HASH_MASK: u32 = 0xffff_fff0;
const HASH_SHIFT: u32 = 32;

/// 1局面分の記録
///
/// data: 出現回数（bit 0-2）| 先手番（bit 3）| 盤面ハッシュの上位28bit（bit 4-31）
#[derive(Debug, Clone, Copy, Default)]
struct ShekElement {
    hand_set: HandSet,
    data: u32,
}

impl ShekElement {
    #[inline]
    fn count(&self) -> u32 {
        self.data & COUNT_MASK
    }

    #[inline]
    fn is_vacant(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    fn turn(&self) -> Color {
        if self.data & TURN_BIT != 0 { Color::Black } else { Color::White }
    }

    #[inline]
    fn matches(&self, board_hash: u64) -> bool {
        !self.is_vacant() && ((board_hash >> HASH_SHIFT) as u32 ^ self.data) & HASH_MASK == 0
    }

    fn set_and_retain(&mut self, key: &ShekKey) {
        self.hand_set = key.hand_set;
        self.data = ((key.board_hash >> HASH_SHIFT) as u32) & HASH_MASK;
        if key.turn == Color::Black {
            self.data |= TURN_BIT;
        }
        self.data |= 1;
    }

    fn retain(&mut self) {
        debug_assert!(self.count() != MAX_COUNT);
        if self.count() != MAX_COUNT {
            self.data += 1;
        }
    }

    fn release(&mut self) {
        if !self.is_vacant() {
            self.data -= 1;
        }
    }

    /// 記録済みの局面と比べた現局面の優劣（手番側から見て）
    fn check(&self, hand_set: HandSet, turn: Color) -> ShekState {
        let recorded = self.turn();
        match hand_set.compare_to(self.hand_set) {
            ShekState::Equal => {
                if recorded != turn {
                    ShekState::Superior
                } else if self.count() >= 3 {
                    ShekState::Equal4
                } else {
                    ShekState::Equal
                }
            }
            // 先手の手駒が増えている
            ShekState::Superior => {
                if turn == Color::Black {
                    ShekState::Superior
                } else if recorded == Color::Black {
                    ShekState::None
                } else {
                    ShekState::Inferior
                }
            }
            // 後手の手駒が増えている
            ShekState::Inferior => {
                if turn == Color::White {
                    ShekState::Superior
                } else if recorded == Color::White {
                    ShekState::None
                } else {
                    ShekState::Inferior
                }
            }
            _ => ShekState::None,
        }
    }
}

/// 4局面分のバケット（64バイト）
#[derive(Debug, Clone, Copy, Default)]
#[repr(C, align(64))]
pub struct ShekBucket {
    slots: [ShekElement; ShekBucket::SIZE],
}

const _: () = assert!(std::mem::size_of::<ShekBucket>() == 64);

impl Bucket for ShekBucket {}

impl ShekBucket {
    const SIZE: usize = 4;

    fn find(&self, board_hash: u64) -> Option<&ShekElement> {
        self.slots.iter().find(|e| e.matches(board_hash))
    }

    fn find_exact(&mut self, key: &ShekKey) -> Option<&mut ShekElement> {
        self.slots.iter_mut().find(|e| e.matches(key.board_hash) && e.hand_set == key.hand_set)
    }

    fn find_vacant(&mut self) -> Option<&mut ShekElement> {
        self.slots.iter_mut().find(|e| e.is_vacant())
    }
}

/// SHEK表
pub struct ShekTable {
    table: HashTable<ShekBucket>,
}

impl ShekTable {
    /// 既定のサイズ（バケット数のlog2）
    pub const DEFAULT_BITS: u32 = 16;
    /// ハッシュの格納部分と添字部分が重ならない最小のサイズ
    pub const MIN_BITS: u32 = 4;

    pub fn new(bits: u32) -> Self {
        debug_assert!(bits >= Self::MIN_BITS);
        Self { table: HashTable::new(bits) }
    }

    pub fn resize(&mut self, bits: u32) {
        debug_assert!(bits >= Self::MIN_BITS);
        self.table.resize(bits);
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        self.table.bits()
    }

    /// 現局面と同じ盤面の記録を調べる
    pub fn check(&self, key: &ShekKey) -> ShekState {
        match self.table.bucket(key.board_hash).find(key.board_hash) {
            Some(element) => element.check(key.hand_set, key.turn),
            None => ShekState::None,
        }
    }

    /// 局面を記録する（出現回数を1増やす）
    ///
    /// バケットが埋まっている場合は記録しない。
    pub fn retain(&mut self, key: &ShekKey) {
        let bucket = self.table.bucket_mut(key.board_hash);
        if let Some(element) = bucket.find_exact(key) {
            element.retain();
        } else if let Some(element) = bucket.find_vacant() {
            element.set_and_retain(key);
        }
    }

    /// 局面の記録を取り消す（出現回数を1減らす）
    pub fn release(&mut self, key: &ShekKey) {
        if let Some(element) = self.table.bucket_mut(key.board_hash).find_exact(key) {
            element.release();
        }
    }
}

impl Default for ShekTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionRecord;
    use crate::types::{Hand, Piece, PieceType, Square};

    use Color::{Black as B, White as W};
    use PieceType as P;

    /// 盤面は共通で、手駒と手番だけを変えた局面
    fn black_fixture(turn: Color, black: [u8; 7], white: [u8; 7]) -> Position {
        let mut r = PositionRecord::empty(turn);
        let pieces = [
            (5, 1, W, P::KING),
            (7, 3, W, P::BISHOP),
            (3, 3, W, P::PAWN),
            (4, 4, W, P::PAWN),
            (2, 4, W, P::PAWN),
            (7, 6, B, P::PAWN),
            (3, 6, B, P::SILVER),
            (6, 7, B, P::PAWN),
            (5, 9, B, P::KING),
        ];
        for (file, rank, c, pt) in pieces {
            r.put(Square::new(file, rank), Piece::new(c, pt));
        }
        r.hands[B.index()] = Hand::from_counts(black);
        r.hands[W.index()] = Hand::from_counts(white);
        Position::from_record(&r).unwrap()
    }

    //                       歩 香 桂 銀 金 角 飛
    const BASE_B: [u8; 7] = [2, 0, 1, 0, 1, 0, 0];
    const BASE_W: [u8; 7] = [1, 1, 0, 0, 0, 0, 1];

    fn check(table: &ShekTable, pos: &Position) -> ShekState {
        table.check(&ShekKey::of(pos))
    }

    #[test]
    fn test_shek_black() {
        let mut table = ShekTable::new(8);
        let pos = black_fixture(B, BASE_B, BASE_W);

        // 先手が香を1枚多く持つ
        let sup1 = black_fixture(B, [2, 1, 1, 0, 1, 0, 0], [1, 0, 0, 0, 0, 0, 1]);
        // 手番だけが違う
        let sup2 = black_fixture(W, BASE_B, BASE_W);
        // 後手番で後手が歩を1枚多く持つ
        let sup3 = black_fixture(W, [1, 0, 1, 0, 1, 0, 0], [2, 1, 0, 0, 0, 0, 1]);
        // 先手番で後手が金を1枚多く持つ
        let inf1 = black_fixture(B, [2, 0, 1, 0, 0, 0, 0], [1, 1, 0, 0, 1, 0, 1]);
        let inf2 = black_fixture(B, [1, 0, 1, 0, 0, 0, 0], [2, 1, 0, 0, 1, 0, 1]);
        // 後手番で先手が歩を1枚多く持つ
        let non1 = black_fixture(W, [3, 0, 1, 0, 1, 0, 0], [0, 1, 0, 0, 0, 0, 1]);
        // 金と飛を交換した
        let non2 = black_fixture(B, [2, 0, 1, 0, 0, 0, 1], [1, 1, 0, 0, 1, 0, 0]);

        assert_eq!(check(&table, &pos), ShekState::None);

        table.retain(&ShekKey::of(&pos));
        assert_eq!(check(&table, &pos), ShekState::Equal);
        assert_eq!(check(&table, &sup1), ShekState::Superior);
        assert_eq!(check(&table, &sup2), ShekState::Superior);
        assert_eq!(check(&table, &sup3), ShekState::Superior);
        assert_eq!(check(&table, &inf1), ShekState::Inferior);
        assert_eq!(check(&table, &inf2), ShekState::Inferior);
        assert_eq!(check(&table, &non1), ShekState::None);
        assert_eq!(check(&table, &non2), ShekState::None);

        let key = ShekKey::of(&pos);
        table.retain(&key);
        assert_eq!(check(&table, &pos), ShekState::Equal);
        table.retain(&key);
        assert_eq!(check(&table, &pos), ShekState::Equal4);

        table.release(&key);
        assert_eq!(check(&table, &pos), ShekState::Equal);
        table.release(&key);
        assert_eq!(check(&table, &pos), ShekState::Equal);
        table.release(&key);
        assert_eq!(check(&table, &pos), ShekState::None);
    }

    #[test]
    fn test_shek_white_to_move() {
        let mut table = ShekTable::new(8);
        let pos = black_fixture(W, BASE_B, BASE_W);
        table.retain(&ShekKey::of(&pos));

        // 後手が金を1枚多く持つ
        let sup = black_fixture(W, [2, 0, 1, 0, 0, 0, 0], [1, 1, 0, 0, 1, 0, 1]);
        // 先手が香を1枚多く持つ
        let inf = black_fixture(W, [2, 1, 1, 0, 1, 0, 0], [1, 0, 0, 0, 0, 0, 1]);
        let turn = black_fixture(B, BASE_B, BASE_W);

        assert_eq!(check(&table, &pos), ShekState::Equal);
        assert_eq!(check(&table, &sup), ShekState::Superior);
        assert_eq!(check(&table, &inf), ShekState::Inferior);
        assert_eq!(check(&table, &turn), ShekState::Superior);
    }

    #[test]
    fn test_shek_distinct_hand_sets_share_bucket() {
        let mut table = ShekTable::new(8);
        let a = black_fixture(B, BASE_B, BASE_W);
        let b = black_fixture(B, [2, 0, 1, 0, 0, 0, 1], [1, 1, 0, 0, 1, 0, 0]);
        table.retain(&ShekKey::of(&a));
        table.retain(&ShekKey::of(&b));
        table.release(&ShekKey::of(&a));
        // aの記録が消えてもbの記録は残る
        assert_eq!(check(&table, &b), ShekState::Equal);
        table.clear();
        assert_eq!(check(&table, &b), ShekState::None);
    }

    #[test]
    fn test_shek_bucket_size() {
        assert_eq!(std::mem::size_of::<ShekBucket>(), 64);
    }
}
