//! 局面の受け渡し用レコード
//!
//! 棋譜形式の解析は外部に任せ、ここでは解析済みの盤面・手駒・手番だけを受け取る。

use crate::types::{Color, Hand, Piece, PieceType, Square};

/// 局面レコード（盤面・手駒・手番）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionRecord {
    /// 各升の駒 [Square]
    pub board: [Piece; Square::NUM],
    /// 手駒 [Color]
    pub hands: [Hand; Color::NUM],
    /// 手番
    pub turn: Color,
}

impl PositionRecord {
    /// 駒のない局面
    pub fn empty(turn: Color) -> Self {
        PositionRecord { board: [Piece::EMPTY; Square::NUM], hands: [Hand::EMPTY; Color::NUM], turn }
    }

    /// 平手の初期配置
    pub fn initial() -> Self {
        let mut record = PositionRecord::empty(Color::Black);
        const BACK_RANK: [PieceType; 9] = [
            PieceType::LANCE,
            PieceType::KNIGHT,
            PieceType::SILVER,
            PieceType::GOLD,
            PieceType::KING,
            PieceType::GOLD,
            PieceType::SILVER,
            PieceType::KNIGHT,
            PieceType::LANCE,
        ];
        for (i, &pt) in BACK_RANK.iter().enumerate() {
            let file = 9 - i as u8;
            record.put(Square::new(file, 9), Piece::new(Color::Black, pt));
            record.put(Square::new(file, 1), Piece::new(Color::White, pt));
            record.put(Square::new(file, 7), Piece::new(Color::Black, PieceType::PAWN));
            record.put(Square::new(file, 3), Piece::new(Color::White, PieceType::PAWN));
        }
        record.put(Square::new(8, 8), Piece::new(Color::Black, PieceType::BISHOP));
        record.put(Square::new(2, 8), Piece::new(Color::Black, PieceType::ROOK));
        record.put(Square::new(2, 2), Piece::new(Color::White, PieceType::BISHOP));
        record.put(Square::new(8, 2), Piece::new(Color::White, PieceType::ROOK));
        record
    }

    /// 駒落ちの初期配置（上手＝後手の駒を落とし、上手から指す）
    pub fn handicap(handicap: Handicap) -> Self {
        let mut record = PositionRecord::initial();
        let removed: &[Square] = match handicap {
            Handicap::Even => return record,
            Handicap::Lance => &[Square::new(1, 1)],
            Handicap::Bishop => &[Square::new(2, 2)],
            Handicap::Rook => &[Square::new(8, 2)],
            Handicap::TwoPieces => &[Square::new(2, 2), Square::new(8, 2)],
        };
        for &sq in removed {
            record.put(sq, Piece::EMPTY);
        }
        record.turn = Color::White;
        record
    }

    #[inline]
    pub fn put(&mut self, sq: Square, piece: Piece) {
        self.board[sq.index()] = piece;
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }
}

/// 駒落ちの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handicap {
    /// 平手
    Even,
    /// 香落ち
    Lance,
    /// 角落ち
    Bishop,
    /// 飛車落ち
    Rook,
    /// 二枚落ち
    TwoPieces,
}

/// 局面レコードの検証エラー
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// 玉がない
    #[error("King not found for {0:?}")]
    MissingKing(Color),

    /// 玉が2枚以上ある
    #[error("Multiple kings for {0:?}")]
    DuplicateKing(Color),

    /// 手駒の枚数が上限を超えている
    #[error("Too many {piece_type} in hand for {color:?}: {count}")]
    TooManyInHand { color: Color, piece_type: PieceType, count: u8 },

    /// 盤上と手駒を合わせた駒数が上限を超えている
    #[error("Too many pieces of kind {0}")]
    TooManyPieces(PieceType),

    /// 行き所のない駒
    #[error("Piece {piece} at {square} can never move")]
    DeadPiece { square: Square, piece: Piece },

    /// 二歩
    #[error("Two pawns on file {file} for {color:?}")]
    DoublePawn { color: Color, file: u8 },

    /// 手番でない側の玉に王手がかかっている
    #[error("Side not to move ({0:?}) is in check")]
    OpponentInCheck(Color),
}
