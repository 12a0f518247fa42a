//! 駒種（PieceType）と駒（Piece）
//!
//! 駒は1バイトに詰める。
//!
//! - bit0-2: 成る前の駒種（歩=0 … 飛=6、玉=7）
//! - bit3: 成り
//! - bit4: 後手
//! - bit5: 空き升

use std::fmt;

use super::Color;

const PROMOTION: u8 = 0x08;
const WHITE: u8 = 0x10;
const EMPTY: u8 = 0x20;
const TYPE_MASK: u8 = 0x0f;
const HAND_MASK: u8 = 0x07;

/// 駒種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PieceType(u8);

impl PieceType {
    pub const PAWN: PieceType = PieceType(0);
    pub const LANCE: PieceType = PieceType(1);
    pub const KNIGHT: PieceType = PieceType(2);
    pub const SILVER: PieceType = PieceType(3);
    pub const GOLD: PieceType = PieceType(4);
    pub const BISHOP: PieceType = PieceType(5);
    pub const ROOK: PieceType = PieceType(6);
    pub const KING: PieceType = PieceType(7);
    pub const TOKIN: PieceType = PieceType(PROMOTION);
    pub const PRO_LANCE: PieceType = PieceType(PROMOTION | 1);
    pub const PRO_KNIGHT: PieceType = PieceType(PROMOTION | 2);
    pub const PRO_SILVER: PieceType = PieceType(PROMOTION | 3);
    pub const HORSE: PieceType = PieceType(PROMOTION | 5);
    pub const DRAGON: PieceType = PieceType(PROMOTION | 6);

    /// 駒種インデックスの上限（配列サイズ用、欠番を含む）
    pub const NUM: usize = 15;

    /// 手駒になる駒種の数
    pub const HAND_NUM: usize = 7;

    /// 盤上に現れる全駒種
    pub const ALL: [PieceType; 14] = [
        PieceType::PAWN,
        PieceType::LANCE,
        PieceType::KNIGHT,
        PieceType::SILVER,
        PieceType::GOLD,
        PieceType::BISHOP,
        PieceType::ROOK,
        PieceType::KING,
        PieceType::TOKIN,
        PieceType::PRO_LANCE,
        PieceType::PRO_KNIGHT,
        PieceType::PRO_SILVER,
        PieceType::HORSE,
        PieceType::DRAGON,
    ];

    /// 手駒になる駒種（升番号と同じく値の小さい順）
    pub const HAND: [PieceType; PieceType::HAND_NUM] = [
        PieceType::PAWN,
        PieceType::LANCE,
        PieceType::KNIGHT,
        PieceType::SILVER,
        PieceType::GOLD,
        PieceType::BISHOP,
        PieceType::ROOK,
    ];

    /// 生の値から生成（呼び出し側で範囲を保証する）
    #[inline]
    pub const fn from_raw(raw: u8) -> PieceType {
        debug_assert!(raw < PieceType::NUM as u8);
        PieceType(raw)
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_promoted(self) -> bool {
        self.0 & PROMOTION != 0
    }

    /// 成ることができる駒種か（成っておらず、金・玉でない）
    #[inline]
    pub const fn can_promote(self) -> bool {
        !self.is_promoted() && self.0 != PieceType::GOLD.0 && self.0 != PieceType::KING.0
    }

    #[inline]
    pub const fn promote(self) -> PieceType {
        debug_assert!(self.can_promote());
        PieceType(self.0 | PROMOTION)
    }

    #[inline]
    pub const fn unpromote(self) -> PieceType {
        PieceType(self.0 & !PROMOTION)
    }

    /// 手駒としての駒種（成りを外したもの）
    #[inline]
    pub const fn hand_type(self) -> PieceType {
        PieceType(self.0 & HAND_MASK)
    }

    /// 手駒インデックス（歩=0 … 飛=6）
    #[inline]
    pub const fn hand_index(self) -> usize {
        debug_assert!(self.0 & HAND_MASK != PieceType::KING.0);
        (self.0 & HAND_MASK) as usize
    }

    /// 金と同じ動きをするか（金・と・成香・成桂・成銀）
    #[inline]
    pub const fn moves_like_gold(self) -> bool {
        self.0 == PieceType::GOLD.0
            || (self.is_promoted() && self.0 != PieceType::HORSE.0 && self.0 != PieceType::DRAGON.0)
    }

    /// CSA形式の駒名
    pub const fn csa_name(self) -> &'static str {
        match self.0 {
            0 => "FU",
            1 => "KY",
            2 => "KE",
            3 => "GI",
            4 => "KI",
            5 => "KA",
            6 => "HI",
            7 => "OU",
            8 => "TO",
            9 => "NY",
            10 => "NK",
            11 => "NG",
            13 => "UM",
            14 => "RY",
            _ => "--",
        }
    }

    /// USI形式の駒打ち用文字（先手表記）
    pub const fn usi_char(self) -> char {
        match self.0 & HAND_MASK {
            0 => 'P',
            1 => 'L',
            2 => 'N',
            3 => 'S',
            4 => 'G',
            5 => 'B',
            6 => 'R',
            _ => 'K',
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.csa_name())
    }
}

/// 駒（駒種 + 先後）
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Piece(u8);

impl Piece {
    /// 空き升
    pub const EMPTY: Piece = Piece(EMPTY);

    /// インデックスの上限（Zobristテーブル等の配列サイズ）
    pub const NUM: usize = 32;

    #[inline]
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        match color {
            Color::Black => Piece(piece_type.0),
            Color::White => Piece(piece_type.0 | WHITE),
        }
    }

    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 配列インデックス（空き升以外で有効）
    #[inline]
    pub const fn index(self) -> usize {
        debug_assert!(!self.is_empty());
        (self.0 & (WHITE | TYPE_MASK)) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == EMPTY
    }

    #[inline]
    pub const fn piece_type(self) -> PieceType {
        PieceType(self.0 & TYPE_MASK)
    }

    /// 先後（空き升に対して呼んではならない）
    #[inline]
    pub const fn color(self) -> Color {
        debug_assert!(!self.is_empty());
        if self.0 & WHITE != 0 { Color::White } else { Color::Black }
    }

    #[inline]
    pub const fn is_black(self) -> bool {
        self.0 & (EMPTY | WHITE) == 0
    }

    #[inline]
    pub const fn is_white(self) -> bool {
        self.0 & WHITE != 0
    }

    /// 指定手番の駒か（空き升はfalse）
    #[inline]
    pub const fn is_color(self, color: Color) -> bool {
        match color {
            Color::Black => self.is_black(),
            Color::White => self.is_white(),
        }
    }

    #[inline]
    pub const fn is_promoted(self) -> bool {
        self.0 & PROMOTION != 0
    }

    #[inline]
    pub const fn promote(self) -> Piece {
        debug_assert!(self.piece_type().can_promote());
        Piece(self.0 | PROMOTION)
    }

    #[inline]
    pub const fn unpromote(self) -> Piece {
        Piece(self.0 & !PROMOTION)
    }

    /// 駒種のみ（先手の駒として返す）
    #[inline]
    pub const fn black(self) -> Piece {
        Piece(self.0 & !WHITE)
    }

    #[inline]
    pub const fn white(self) -> Piece {
        Piece(self.0 | WHITE)
    }
}

impl Default for Piece {
    fn default() -> Self {
        Piece::EMPTY
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Piece {
    /// CSA形式（例: +FU, -KA）
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(" * ");
        }
        let sign = if self.is_black() { '+' } else { '-' };
        write!(f, "{sign}{}", self.piece_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_projections() {
        let p = Piece::new(Color::White, PieceType::SILVER);
        assert!(p.is_white());
        assert!(!p.is_black());
        assert_eq!(p.color(), Color::White);
        assert_eq!(p.promote().piece_type(), PieceType::PRO_SILVER);
        assert_eq!(p.promote().unpromote(), p);
        assert_eq!(p.black(), Piece::new(Color::Black, PieceType::SILVER));
        assert_eq!(p.black().white(), p);
    }

    #[test]
    fn test_empty_piece() {
        assert!(Piece::EMPTY.is_empty());
        assert!(!Piece::EMPTY.is_black());
        assert!(!Piece::EMPTY.is_white());
    }

    #[test]
    fn test_promotion_rules() {
        assert!(PieceType::PAWN.can_promote());
        assert!(PieceType::ROOK.can_promote());
        assert!(!PieceType::GOLD.can_promote());
        assert!(!PieceType::KING.can_promote());
        assert!(!PieceType::HORSE.can_promote());
        assert_eq!(PieceType::DRAGON.hand_type(), PieceType::ROOK);
        assert!(PieceType::TOKIN.moves_like_gold());
        assert!(PieceType::PRO_SILVER.moves_like_gold());
        assert!(!PieceType::HORSE.moves_like_gold());
        assert!(!PieceType::SILVER.moves_like_gold());
    }

    #[test]
    fn test_piece_index_range() {
        for color in Color::ALL {
            for pt in PieceType::ALL {
                assert!(Piece::new(color, pt).index() < Piece::NUM);
            }
        }
    }
}
