//! Zobristハッシュ
//!
//! 局面のハッシュは盤面・手駒・手番の3つの部分のXORで表す。
//! 手駒は枚数ごとに異なる乱数を持ち、枚数0のキーは0とする。

use crate::types::{Color, Hand, Piece, PieceType, Square};

/// 手駒の最大枚数+1（歩18枚）
const HAND_COUNT_NUM: usize = 19;

/// Zobristハッシュ用乱数テーブル
pub struct Zobrist {
    /// 後手番のとき盤面ハッシュに加えるキー
    pub turn: u64,
    /// 駒×升 [Piece.index()][Square.index()]
    pub board: [[u64; Square::NUM]; Piece::NUM],
    /// 手駒 [Color][手駒インデックス][枚数]
    pub hand: [[[u64; HAND_COUNT_NUM]; PieceType::HAND_NUM]; Color::NUM],
}

impl Zobrist {
    /// テーブル初期化
    pub const fn init() -> Self {
        let mut zobrist = Zobrist {
            turn: 0,
            board: [[0; Square::NUM]; Piece::NUM],
            hand: [[[0; HAND_COUNT_NUM]; PieceType::HAND_NUM]; Color::NUM],
        };

        let mut seed = 0x5c3f_1d2e_8a97_b046u64;

        seed = xorshift64(seed);
        zobrist.turn = seed;

        let mut pc = 0;
        while pc < Piece::NUM {
            let mut sq = 0;
            while sq < Square::NUM {
                seed = xorshift64(seed);
                zobrist.board[pc][sq] = seed;
                sq += 1;
            }
            pc += 1;
        }

        // 枚数0は常に0
        let mut c = 0;
        while c < Color::NUM {
            let mut pt = 0;
            while pt < PieceType::HAND_NUM {
                let mut n = 1;
                while n < HAND_COUNT_NUM {
                    seed = xorshift64(seed);
                    zobrist.hand[c][pt][n] = seed;
                    n += 1;
                }
                pt += 1;
            }
            c += 1;
        }

        zobrist
    }
}

/// XorShift64疑似乱数生成（const fn対応）
const fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// グローバルZobristテーブル
pub static ZOBRIST: Zobrist = Zobrist::init();

/// 駒と升のハッシュ
#[inline]
pub fn zobrist_board(pc: Piece, sq: Square) -> u64 {
    ZOBRIST.board[pc.index()][sq.index()]
}

/// 手駒の枚数のハッシュ
#[inline]
pub fn zobrist_hand(c: Color, pt: PieceType, count: u8) -> u64 {
    ZOBRIST.hand[c.index()][pt.hand_index()][count as usize]
}

/// 手番のハッシュ
#[inline]
pub fn zobrist_turn() -> u64 {
    ZOBRIST.turn
}

/// 手駒全体のハッシュ
pub fn hand_hash(c: Color, hand: &Hand) -> u64 {
    PieceType::HAND.iter().fold(0, |acc, &pt| acc ^ zobrist_hand(c, pt, hand.get(pt)))
}
