//! 手番（Color）

use serde::{Deserialize, Serialize};

/// 手番（先手/後手）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    /// 手番の数
    pub const NUM: usize = 2;

    /// 全手番
    pub const ALL: [Color; Color::NUM] = [Color::Black, Color::White];

    /// 相手番を返す
    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 前方の段差分（先手は段が減る方向、後手は増える方向）
    ///
    /// 指し手生成・利き計算は手番ごとに処理を複製せず、この値で向きを切り替える。
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::Black => -1,
            Color::White => 1,
        }
    }

    /// 先手視点の評価値に掛ける符号
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Color::Black => 1,
            Color::White => -1,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}
