//! 回転ビットボード
//!
//! 遠方駒の利きは「利きの通る直線上の内側7升の占有パターン」から
//! 表引きで求める。筋方向のパターンは通常のBitboardから直接取り出せるが、
//! 段方向・斜め方向は升の並びが連続しないため、直線ごとに連続したビット列に
//! 並べ替えた64bitのボードを局面と同時に更新して持つ。
//!
//! - `Line`: 直線の種類（筋・段・斜め2方向）
//! - `RotatedBitboard`: 段・斜め方向の並べ替えボード
//!
//! 直線の両端の升は利きの到達範囲に影響しないため、その直線のパターンには含めない。

use std::sync::LazyLock;

use super::Bitboard;
use crate::types::Square;

/// 直線の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// 筋（縦）
    File = 0,
    /// 段（横）
    Rank = 1,
    /// 筋インデックス+段インデックスが一定の斜め
    Diag45 = 2,
    /// 筋インデックス-段インデックスが一定の斜め
    Diag135 = 3,
}

impl Line {
    pub const NUM: usize = 4;

    pub const ALL: [Line; Line::NUM] = [Line::File, Line::Rank, Line::Diag45, Line::Diag135];

    /// 回転ボードで管理する直線
    pub const ROTATED: [Line; 3] = [Line::Rank, Line::Diag45, Line::Diag135];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 直線に沿った一歩（筋差分, 段差分）。逆向きは符号を反転する。
    pub const fn step(self) -> (i32, i32) {
        match self {
            Line::File => (0, 1),
            Line::Rank => (1, 0),
            Line::Diag45 => (1, 1),
            Line::Diag135 => (1, -1),
        }
    }
}

/// 占有パターンの最大値+1（内側7升）
pub const PATTERN_NUM: usize = 128;

const NO_BIT: u8 = 0xff;

/// 升ごとの並べ替え情報
struct LineLayout {
    /// 回転ボード上のビット位置（直線の端はNO_BIT）
    bit: [[u8; Square::NUM]; Line::NUM],
    /// パターン取り出し時の右シフト量
    shift: [[u8; Square::NUM]; Line::NUM],
    /// パターン取り出し後のマスク
    mask: [[u8; Square::NUM]; Line::NUM],
}

static LAYOUT: LazyLock<LineLayout> = LazyLock::new(LineLayout::new);

/// 直線の内側升の筋インデックス範囲（両端の升を除く）
///
/// 斜めの直線は筋インデックスの小さい順に並べる。内側升がない場合は空の範囲。
fn diag_inner_range(line: Line, key: i32) -> (i32, i32) {
    match line {
        Line::Diag45 => ((key - 8).max(0) + 1, key.min(8) - 1),
        _ => (key.max(0) + 1, (8 + key).min(8) - 1),
    }
}

#[inline]
fn inner_count(lo: i32, hi: i32) -> i32 {
    (hi - lo + 1).max(0)
}

/// 直線の幾何情報
///
/// (直線上での位置（両端の升はNone）, 直線の先頭ビット位置, 直線上の内側升の数)
///
/// 筋方向だけはBitboardのレーン内ビット位置をそのまま使う。
fn line_geometry(line: Line, fi: i32, ri: i32) -> (Option<i32>, i32, i32) {
    match line {
        Line::File => {
            let base = if fi < 5 { fi * 9 } else { (fi - 5) * 9 };
            let pos = (1..=7).contains(&ri).then_some(ri - 1);
            (pos, base + 1, 7)
        }
        Line::Rank => {
            let pos = (1..=7).contains(&fi).then_some(fi - 1);
            (pos, ri * 7, 7)
        }
        Line::Diag45 | Line::Diag135 => {
            let (key, first) = match line {
                Line::Diag45 => (fi + ri, 0),
                _ => (fi - ri, -8),
            };
            let (lo, hi) = diag_inner_range(line, key);
            let offset: i32 = (first..key)
                .map(|e| {
                    let (l, h) = diag_inner_range(line, e);
                    inner_count(l, h)
                })
                .sum();
            let pos = (lo..=hi).contains(&fi).then_some(fi - lo);
            (pos, offset, inner_count(lo, hi))
        }
    }
}

impl LineLayout {
    fn new() -> Self {
        let mut layout = LineLayout {
            bit: [[NO_BIT; Square::NUM]; Line::NUM],
            shift: [[0; Square::NUM]; Line::NUM],
            mask: [[0; Square::NUM]; Line::NUM],
        };
        for sq in Square::all() {
            let fi = sq.file_index() as i32;
            let ri = sq.rank_index() as i32;
            for line in Line::ALL {
                let (pos, offset, len) = line_geometry(line, fi, ri);
                let l = line.index();
                let s = sq.index();
                layout.shift[l][s] = offset as u8;
                layout.mask[l][s] = ((1u32 << len) - 1) as u8;
                if let Some(pos) = pos {
                    layout.bit[l][s] = (offset + pos) as u8;
                }
            }
        }
        layout
    }
}

/// 直線上の内側升の並び順（占有パターンのビット位置）
///
/// 直線の両端の升はNone。
pub(crate) fn pattern_index(line: Line, sq: Square) -> Option<u32> {
    let (pos, _, _) = line_geometry(line, sq.file_index() as i32, sq.rank_index() as i32);
    pos.map(|p| p as u32)
}

/// 筋方向の占有パターン（通常のBitboardから取り出す）
#[inline]
pub fn file_pattern(occupied: &Bitboard, sq: Square) -> usize {
    let (lane, _) = Bitboard::lane_bit(sq);
    let shift = LAYOUT.shift[Line::File.index()][sq.index()];
    ((occupied.lane(lane) >> shift) & 0x7f) as usize
}

/// 回転ビットボード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RotatedBitboard {
    line: Line,
    bits: u64,
}

impl RotatedBitboard {
    /// 空の回転ボード
    pub const fn new(line: Line) -> Self {
        debug_assert!(!matches!(line, Line::File));
        RotatedBitboard { line, bits: 0 }
    }

    /// Bitboardから作り直す
    pub fn from_bitboard(line: Line, bb: &Bitboard) -> Self {
        let mut rotated = RotatedBitboard::new(line);
        for sq in bb.iter() {
            rotated.set(sq);
        }
        rotated
    }

    #[inline]
    pub const fn line(&self) -> Line {
        self.line
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.bits
    }

    /// 升を立てる（直線の端の升は何もしない）
    #[inline]
    pub fn set(&mut self, sq: Square) {
        let bit = LAYOUT.bit[self.line.index()][sq.index()];
        if bit != NO_BIT {
            self.bits |= 1u64 << bit;
        }
    }

    #[inline]
    pub fn unset(&mut self, sq: Square) {
        let bit = LAYOUT.bit[self.line.index()][sq.index()];
        if bit != NO_BIT {
            self.bits &= !(1u64 << bit);
        }
    }

    /// 升を通る直線の占有パターン
    #[inline]
    pub fn pattern(&self, sq: Square) -> usize {
        let l = self.line.index();
        let s = sq.index();
        ((self.bits >> LAYOUT.shift[l][s]) & LAYOUT.mask[l][s] as u64) as usize
    }
}
