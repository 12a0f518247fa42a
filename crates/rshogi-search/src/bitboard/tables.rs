//! 利きテーブルとBitboardマスク
//!
//! 近接駒の利きは差分リストから、遠方駒の利きは直線ごと・占有パターンごとに
//! 盤上をたどって、初回参照時に一度だけ構築する。構築後は読み取り専用。

use std::sync::LazyLock;

use crate::types::{Color, Square};

use super::Bitboard;
use super::rotated::{Line, PATTERN_NUM, pattern_index};

/// 筋のBitboard（`Square::file_index()` で引く、0 = 9筋）
pub static FILE_BB: [Bitboard; 9] = init_file_bb();

/// 段のBitboard（`Square::rank_index()` で引く、0 = 1段）
pub static RANK_BB: [Bitboard; 9] = init_rank_bb();

const fn square_bits(idx: usize) -> (u64, u64) {
    if idx < 45 { (1u64 << idx, 0) } else { (0, 1u64 << (idx - 45)) }
}

const fn init_file_bb() -> [Bitboard; 9] {
    let mut result = [Bitboard::EMPTY; 9];
    let mut fi = 0;
    while fi < 9 {
        let mut p0 = 0u64;
        let mut p1 = 0u64;
        let mut ri = 0;
        while ri < 9 {
            let (a, b) = square_bits(fi * 9 + ri);
            p0 |= a;
            p1 |= b;
            ri += 1;
        }
        result[fi] = Bitboard::new(p0, p1);
        fi += 1;
    }
    result
}

const fn init_rank_bb() -> [Bitboard; 9] {
    let mut result = [Bitboard::EMPTY; 9];
    let mut ri = 0;
    while ri < 9 {
        let mut p0 = 0u64;
        let mut p1 = 0u64;
        let mut fi = 0;
        while fi < 9 {
            let (a, b) = square_bits(fi * 9 + ri);
            p0 |= a;
            p1 |= b;
            fi += 1;
        }
        result[ri] = Bitboard::new(p0, p1);
        ri += 1;
    }
    result
}

/// 敵陣（成れる領域）
#[inline]
pub fn promotion_zone(color: Color) -> Bitboard {
    match color {
        Color::Black => RANK_BB[0] | RANK_BB[1] | RANK_BB[2],
        Color::White => RANK_BB[6] | RANK_BB[7] | RANK_BB[8],
    }
}

/// 8方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// (筋差分, 段差分)。Upは段が減る方向（先手の前方）、Leftは筋が増える方向。
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (1, 0),
            Direction::Right => (-1, 0),
            Direction::UpLeft => (1, -1),
            Direction::UpRight => (-1, -1),
            Direction::DownLeft => (1, 1),
            Direction::DownRight => (-1, 1),
        }
    }

    /// 縦横か（斜めでないか）
    #[inline]
    pub const fn is_orthogonal(self) -> bool {
        matches!(self, Direction::Up | Direction::Down | Direction::Left | Direction::Right)
    }

    #[inline]
    pub const fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::UpLeft => Direction::DownRight,
            Direction::UpRight => Direction::DownLeft,
            Direction::DownLeft => Direction::UpRight,
            Direction::DownRight => Direction::UpLeft,
        }
    }

    /// 手番から見た前方か（香の利きの向き）
    #[inline]
    pub const fn is_forward(self, color: Color) -> bool {
        match color {
            Color::Black => matches!(self, Direction::Up),
            Color::White => matches!(self, Direction::Down),
        }
    }

    fn from_delta(df: i32, dr: i32) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.delta() == (df.signum(), dr.signum()))
    }
}

// 先手から見た近接駒の利き（筋差分, 段差分）
const PAWN_DELTAS: &[(i32, i32)] = &[(0, -1)];
const KNIGHT_DELTAS: &[(i32, i32)] = &[(1, -2), (-1, -2)];
const SILVER_DELTAS: &[(i32, i32)] = &[(0, -1), (1, -1), (-1, -1), (1, 1), (-1, 1)];
const GOLD_DELTAS: &[(i32, i32)] = &[(0, -1), (1, -1), (-1, -1), (1, 0), (-1, 0), (0, 1)];
const KING_DELTAS: &[(i32, i32)] =
    &[(0, -1), (1, -1), (-1, -1), (1, 0), (-1, 0), (0, 1), (1, 1), (-1, 1)];

struct AttackTables {
    pawn: [[Bitboard; Square::NUM]; Color::NUM],
    knight: [[Bitboard; Square::NUM]; Color::NUM],
    silver: [[Bitboard; Square::NUM]; Color::NUM],
    gold: [[Bitboard; Square::NUM]; Color::NUM],
    king: [Bitboard; Square::NUM],
    /// 香の利きの届く範囲（盤上に駒がない場合） [Color][Square]
    lance_mask: [[Bitboard; Square::NUM]; Color::NUM],
    /// 遠方駒の利き [Line][Square][pattern]
    slider: Vec<[Bitboard; PATTERN_NUM]>,
    /// 2升の間の升 [from][to]
    between: Vec<[Bitboard; Square::NUM]>,
    /// 2升を結ぶ方向 [from][to]
    direction: Vec<[Option<Direction>; Square::NUM]>,
}

static TABLES: LazyLock<AttackTables> = LazyLock::new(AttackTables::new);

fn step_table(deltas: &[(i32, i32)]) -> [[Bitboard; Square::NUM]; Color::NUM] {
    let mut table = [[Bitboard::EMPTY; Square::NUM]; Color::NUM];
    for color in Color::ALL {
        // 後手は段方向を反転
        let flip = -(color.forward() as i32);
        for sq in Square::all() {
            let mut bb = Bitboard::EMPTY;
            for &(df, dr) in deltas {
                if let Some(to) = sq.offset(df, dr * flip) {
                    bb.set(to);
                }
            }
            table[color.index()][sq.index()] = bb;
        }
    }
    table
}

/// 直線に沿って両方向にたどり、パターンで占有とされた升で止まる
fn slide(line: Line, sq: Square, pattern: usize) -> Bitboard {
    let (df, dr) = line.step();
    let mut bb = Bitboard::EMPTY;
    for sign in [1, -1] {
        let mut cur = sq;
        while let Some(next) = cur.offset(df * sign, dr * sign) {
            bb.set(next);
            let blocked = pattern_index(line, next).is_some_and(|k| pattern & (1 << k) != 0);
            if blocked {
                break;
            }
            cur = next;
        }
    }
    bb
}

impl AttackTables {
    fn new() -> Self {
        let mut slider = vec![[Bitboard::EMPTY; PATTERN_NUM]; Line::NUM * Square::NUM];
        for line in Line::ALL {
            for sq in Square::all() {
                let entry = &mut slider[line.index() * Square::NUM + sq.index()];
                for (pattern, bb) in entry.iter_mut().enumerate() {
                    *bb = slide(line, sq, pattern);
                }
            }
        }

        let mut lance_mask = [[Bitboard::EMPTY; Square::NUM]; Color::NUM];
        for color in Color::ALL {
            for sq in Square::all() {
                let mut bb = Bitboard::EMPTY;
                let mut cur = sq;
                while let Some(next) = cur.forward(color) {
                    bb.set(next);
                    cur = next;
                }
                lance_mask[color.index()][sq.index()] = bb;
            }
        }

        let mut between = vec![[Bitboard::EMPTY; Square::NUM]; Square::NUM];
        let mut direction = vec![[None; Square::NUM]; Square::NUM];
        for from in Square::all() {
            for to in Square::all() {
                if from == to {
                    continue;
                }
                let df = to.file() as i32 - from.file() as i32;
                let dr = to.rank() as i32 - from.rank() as i32;
                if df != 0 && dr != 0 && df.abs() != dr.abs() {
                    continue;
                }
                let Some(dir) = Direction::from_delta(df, dr) else {
                    continue;
                };
                direction[from.index()][to.index()] = Some(dir);
                let (sf, sr) = dir.delta();
                let mut bb = Bitboard::EMPTY;
                let mut cur = from;
                while let Some(next) = cur.offset(sf, sr) {
                    if next == to {
                        break;
                    }
                    bb.set(next);
                    cur = next;
                }
                between[from.index()][to.index()] = bb;
            }
        }

        AttackTables {
            pawn: step_table(PAWN_DELTAS),
            knight: step_table(KNIGHT_DELTAS),
            silver: step_table(SILVER_DELTAS),
            gold: step_table(GOLD_DELTAS),
            king: step_table(KING_DELTAS)[Color::Black.index()],
            lance_mask,
            slider,
            between,
            direction,
        }
    }
}

/// 利きテーブルを構築しておく（探索開始前に呼ぶと初回参照の遅延がなくなる）
pub fn init_tables() {
    LazyLock::force(&TABLES);
}

// === 利き取得関数 ===

#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.pawn[color.index()][sq.index()]
}

#[inline]
pub fn knight_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.knight[color.index()][sq.index()]
}

#[inline]
pub fn silver_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.silver[color.index()][sq.index()]
}

/// 金の利き（と・成香・成桂・成銀も同じ）
#[inline]
pub fn gold_attacks(color: Color, sq: Square) -> Bitboard {
    TABLES.gold[color.index()][sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    TABLES.king[sq.index()]
}

/// 香の前方の升（駒がない場合の利き）
#[inline]
pub fn lance_mask(color: Color, sq: Square) -> Bitboard {
    TABLES.lance_mask[color.index()][sq.index()]
}

/// 直線上の遠方駒の利き
#[inline]
pub fn line_attacks(line: Line, sq: Square, pattern: usize) -> Bitboard {
    debug_assert!(pattern < PATTERN_NUM);
    TABLES.slider[line.index() * Square::NUM + sq.index()][pattern]
}

/// 2升の間の升（同一直線上にない場合は空）
#[inline]
pub fn between(from: Square, to: Square) -> Bitboard {
    TABLES.between[from.index()][to.index()]
}

/// fromから見たtoの方向（同一直線上にない場合はNone）
#[inline]
pub fn direction(from: Square, to: Square) -> Option<Direction> {
    TABLES.direction[from.index()][to.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_rank_bb() {
        for sq in Square::all() {
            assert!(FILE_BB[sq.file_index()].contains(sq));
            assert!(RANK_BB[sq.rank_index()].contains(sq));
        }
        assert!(FILE_BB.iter().all(|bb| bb.count() == 9));
        assert!(RANK_BB.iter().all(|bb| bb.count() == 9));
        assert_eq!(promotion_zone(Color::Black).count(), 27);
    }

    #[test]
    fn test_step_attacks() {
        let sq = Square::new(5, 5);
        assert_eq!(pawn_attacks(Color::Black, sq), Bitboard::from_square(Square::new(5, 4)));
        assert_eq!(pawn_attacks(Color::White, sq), Bitboard::from_square(Square::new(5, 6)));
        assert_eq!(knight_attacks(Color::Black, sq).count(), 2);
        assert!(knight_attacks(Color::Black, sq).contains(Square::new(4, 3)));
        assert!(knight_attacks(Color::White, sq).contains(Square::new(6, 7)));
        assert_eq!(silver_attacks(Color::Black, sq).count(), 5);
        assert_eq!(gold_attacks(Color::White, sq).count(), 6);
        assert!(gold_attacks(Color::White, sq).contains(Square::new(4, 6)));
        assert!(!gold_attacks(Color::White, sq).contains(Square::new(4, 4)));
        assert_eq!(king_attacks(sq).count(), 8);
        assert_eq!(king_attacks(Square::new(1, 1)).count(), 3);
        assert!(knight_attacks(Color::Black, Square::new(3, 2)).is_empty());
    }

    #[test]
    fn test_slider_on_empty_board() {
        let sq = Square::new(5, 5);
        let file = line_attacks(Line::File, sq, 0);
        let rank = line_attacks(Line::Rank, sq, 0);
        assert_eq!((file | rank).count(), 16);
        let d45 = line_attacks(Line::Diag45, sq, 0);
        let d135 = line_attacks(Line::Diag135, sq, 0);
        assert_eq!((d45 | d135).count(), 16);
        // 角の隅では片方の斜めしかない
        let corner = Square::new(9, 9);
        assert_eq!(
            (line_attacks(Line::Diag45, corner, 0) | line_attacks(Line::Diag135, corner, 0))
                .count(),
            8
        );
    }

    #[test]
    fn test_slider_blocked() {
        // 5五の飛車、5三に駒
        let sq = Square::new(5, 5);
        let blocker = Square::new(5, 3);
        let k = pattern_index(Line::File, blocker).unwrap();
        let file = line_attacks(Line::File, sq, 1 << k);
        assert!(file.contains(Square::new(5, 4)));
        assert!(file.contains(blocker));
        assert!(!file.contains(Square::new(5, 2)));
        assert!(file.contains(Square::new(5, 9)));
    }

    #[test]
    fn test_lance_mask() {
        assert_eq!(lance_mask(Color::Black, Square::new(1, 9)).count(), 8);
        assert!(lance_mask(Color::Black, Square::new(1, 1)).is_empty());
        assert_eq!(lance_mask(Color::White, Square::new(1, 1)).count(), 8);
    }

    #[test]
    fn test_between_and_direction() {
        let a = Square::new(5, 9);
        let b = Square::new(5, 1);
        assert_eq!(between(a, b).count(), 7);
        assert_eq!(direction(a, b), Some(Direction::Up));
        assert_eq!(direction(b, a), Some(Direction::Down));
        assert_eq!(direction(Square::new(9, 9), Square::new(1, 1)), Some(Direction::UpRight));
        assert!(direction(Square::new(5, 5), Square::new(4, 3)).is_none());
        assert!(between(Square::new(5, 5), Square::new(4, 3)).is_empty());
        assert!(between(Square::new(5, 5), Square::new(4, 4)).is_empty());
        for dir in Direction::ALL {
            assert_eq!(dir.reverse().reverse(), dir);
        }
    }
}
