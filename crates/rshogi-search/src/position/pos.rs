//! 局面（Position）

use std::fmt;

use crate::bitboard::{
    Bitboard, Direction, FILE_BB, Line, RotatedBitboard, between, direction, file_pattern,
    gold_attacks, king_attacks, knight_attacks, lance_mask, line_attacks, pawn_attacks,
    silver_attacks,
};
use crate::movegen::{MoveList, generate_evasions};
use crate::types::{Color, Hand, Move, Piece, PieceType, Square};

use super::record::{Handicap, PositionError, PositionRecord};
use super::zobrist::{zobrist_board, zobrist_hand, zobrist_turn};

/// 駒種別Bitboardの区分
///
/// 金と成小駒は利きが同じなので1枚のBitboardにまとめる。玉は升だけを持つ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceSet {
    Pawn = 0,
    Lance = 1,
    Knight = 2,
    Silver = 3,
    GoldLike = 4,
    Bishop = 5,
    Rook = 6,
    Horse = 7,
    Dragon = 8,
}

impl PieceSet {
    pub const NUM: usize = 9;

    pub const ALL: [PieceSet; PieceSet::NUM] = [
        PieceSet::Pawn,
        PieceSet::Lance,
        PieceSet::Knight,
        PieceSet::Silver,
        PieceSet::GoldLike,
        PieceSet::Bishop,
        PieceSet::Rook,
        PieceSet::Horse,
        PieceSet::Dragon,
    ];

    /// 駒種の属する区分（玉はNone）
    #[inline]
    pub const fn of(pt: PieceType) -> Option<PieceSet> {
        match pt.raw() {
            0 => Some(PieceSet::Pawn),
            1 => Some(PieceSet::Lance),
            2 => Some(PieceSet::Knight),
            3 => Some(PieceSet::Silver),
            4 | 8 | 9 | 10 | 11 => Some(PieceSet::GoldLike),
            5 => Some(PieceSet::Bishop),
            6 => Some(PieceSet::Rook),
            13 => Some(PieceSet::Horse),
            14 => Some(PieceSet::Dragon),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 王手の状態（王手している駒の升、最大2つ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckState {
    count: u8,
    checkers: [Square; 2],
}

impl CheckState {
    pub const NONE: CheckState = CheckState { count: 0, checkers: [Square::INVALID; 2] };

    #[inline]
    pub const fn is_check(&self) -> bool {
        self.count != 0
    }

    /// 両王手か
    #[inline]
    pub const fn is_double(&self) -> bool {
        self.count >= 2
    }

    #[inline]
    pub const fn count(&self) -> usize {
        self.count as usize
    }

    /// 王手している駒の升
    #[inline]
    pub fn checkers(&self) -> &[Square] {
        &self.checkers[..self.count as usize]
    }

    fn push(&mut self, sq: Square) {
        if (self.count as usize) < self.checkers.len() {
            self.checkers[self.count as usize] = sq;
            self.count += 1;
        }
    }
}

/// 成り・不成の可否 (不成可, 成り可)
///
/// 指し手生成と指し手の検証で同じ規則を使う。
/// - 歩・角・飛は成れるときは成りのみ
/// - 香・桂は行き所のない段（香は2段目も含む）では成りのみ、3段目は両方
/// - 銀は両方
#[inline]
pub(crate) fn promotion_options(us: Color, pt: PieceType, from: Square, to: Square) -> (bool, bool) {
    if !pt.can_promote() || !(from.is_promotion_zone(us) || to.is_promotion_zone(us)) {
        return (true, false);
    }
    match pt {
        PieceType::PAWN | PieceType::BISHOP | PieceType::ROOK => (false, true),
        PieceType::LANCE | PieceType::KNIGHT => (to.relative_rank(us) >= 3, true),
        _ => (true, true),
    }
}

/// 駒を打てる段か（行き所のない駒の禁止）
#[inline]
pub(crate) fn drop_rank_allowed(us: Color, pt: PieceType, to: Square) -> bool {
    match pt {
        PieceType::PAWN | PieceType::LANCE => to.relative_rank(us) >= 2,
        PieceType::KNIGHT => to.relative_rank(us) >= 3,
        _ => true,
    }
}

/// 遠方駒がdir方向（駒から見た方向）に利きを持つか
#[inline]
fn slides_toward(piece: Piece, dir: Direction) -> bool {
    match piece.piece_type() {
        PieceType::LANCE => dir.is_forward(piece.color()),
        PieceType::BISHOP | PieceType::HORSE => !dir.is_orthogonal(),
        PieceType::ROOK | PieceType::DRAGON => dir.is_orthogonal(),
        _ => false,
    }
}

/// 1升だけ届く利き（馬・龍の近接部分を含む）
#[inline]
fn step_reach(piece: Piece, sq: Square) -> Bitboard {
    let c = piece.color();
    match piece.piece_type() {
        PieceType::PAWN => pawn_attacks(c, sq),
        PieceType::KNIGHT => knight_attacks(c, sq),
        PieceType::SILVER => silver_attacks(c, sq),
        PieceType::LANCE | PieceType::BISHOP | PieceType::ROOK => Bitboard::EMPTY,
        PieceType::KING | PieceType::HORSE | PieceType::DRAGON => king_attacks(sq),
        _ => gold_attacks(c, sq),
    }
}

/// 将棋の局面
///
/// 盤面配列・Bitboard・回転Bitboard・手駒・ハッシュは `put_piece` / `remove_piece` と
/// 手駒の増減を通じてのみ更新し、常に互いに整合させる。
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// 各升の駒 [Square]
    board: [Piece; Square::NUM],
    /// 駒種別Bitboard [Color][PieceSet]
    by_set: [[Bitboard; PieceSet::NUM]; Color::NUM],
    /// 先後別Bitboard（玉を含む）
    by_color: [Bitboard; Color::NUM],
    /// 全駒
    occupied: Bitboard,
    /// 回転Bitboard（段・斜め2方向）
    rotated: [RotatedBitboard; 3],
    /// 玉の位置 [Color]
    king_square: [Square; Color::NUM],
    /// 手駒 [Color]
    hand: [Hand; Color::NUM],
    side_to_move: Color,
    board_hash: u64,
    hand_hash: u64,
}

impl Position {
    // ========== 局面設定 ==========

    fn empty(turn: Color) -> Self {
        Position {
            board: [Piece::EMPTY; Square::NUM],
            by_set: [[Bitboard::EMPTY; PieceSet::NUM]; Color::NUM],
            by_color: [Bitboard::EMPTY; Color::NUM],
            occupied: Bitboard::EMPTY,
            rotated: Line::ROTATED.map(RotatedBitboard::new),
            king_square: [Square::INVALID; Color::NUM],
            hand: [Hand::EMPTY; Color::NUM],
            side_to_move: turn,
            board_hash: 0,
            hand_hash: 0,
        }
    }

    /// 検証なしでレコードから組み立てる
    fn build(record: &PositionRecord) -> Self {
        let mut pos = Position::empty(record.turn);
        for sq in Square::all() {
            let pc = record.piece_on(sq);
            if !pc.is_empty() {
                pos.put_piece(pc, sq);
            }
        }
        for color in Color::ALL {
            for pt in PieceType::HAND {
                for _ in 0..record.hands[color.index()].get(pt) {
                    pos.add_hand(color, pt);
                }
            }
        }
        pos
    }

    /// 平手の初期局面
    pub fn initial() -> Self {
        Position::build(&PositionRecord::initial())
    }

    /// 駒落ちの初期局面（上手＝後手から指す）
    pub fn handicap(handicap: Handicap) -> Self {
        Position::build(&PositionRecord::handicap(handicap))
    }

    /// レコードを検証して局面を作る
    pub fn from_record(record: &PositionRecord) -> Result<Self, PositionError> {
        for color in Color::ALL {
            let hand = &record.hands[color.index()];
            for (i, pt) in PieceType::HAND.iter().enumerate() {
                let count = hand.get(*pt);
                if count > Hand::MAX_COUNTS[i] {
                    return Err(PositionError::TooManyInHand { color, piece_type: *pt, count });
                }
            }
        }

        let mut kings = [0u32; Color::NUM];
        let mut totals = [0u32; PieceType::HAND_NUM];
        let mut pawn_files = [[false; 9]; Color::NUM];
        for sq in Square::all() {
            let pc = record.piece_on(sq);
            if pc.is_empty() {
                continue;
            }
            let color = pc.color();
            let pt = pc.piece_type();
            if pt == PieceType::KING {
                kings[color.index()] += 1;
                continue;
            }
            if !pt.is_promoted() && !drop_rank_allowed(color, pt, sq) {
                return Err(PositionError::DeadPiece { square: sq, piece: pc });
            }
            if pt == PieceType::PAWN {
                let seen = &mut pawn_files[color.index()][sq.file_index()];
                if *seen {
                    return Err(PositionError::DoublePawn { color, file: sq.file() });
                }
                *seen = true;
            }
            totals[pt.hand_index()] += 1;
        }

        for color in Color::ALL {
            match kings[color.index()] {
                0 => return Err(PositionError::MissingKing(color)),
                1 => {}
                _ => return Err(PositionError::DuplicateKing(color)),
            }
            for pt in PieceType::HAND {
                totals[pt.hand_index()] += record.hands[color.index()].get(pt) as u32;
            }
        }
        for pt in PieceType::HAND {
            if totals[pt.hand_index()] > Hand::MAX_COUNTS[pt.hand_index()] as u32 {
                return Err(PositionError::TooManyPieces(pt));
            }
        }

        let pos = Position::build(record);
        let them = !pos.side_to_move;
        if pos.is_attacked(pos.side_to_move, pos.king_square(them)) {
            return Err(PositionError::OpponentInCheck(them));
        }
        Ok(pos)
    }

    /// レコードへ書き出す
    pub fn to_record(&self) -> PositionRecord {
        PositionRecord { board: self.board, hands: self.hand, turn: self.side_to_move }
    }

    // ========== 盤面アクセス ==========

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    /// 手番側の駒すべて（玉を含む）
    #[inline]
    pub fn pieces_c(&self, c: Color) -> Bitboard {
        self.by_color[c.index()]
    }

    #[inline]
    pub fn pieces(&self, c: Color, set: PieceSet) -> Bitboard {
        self.by_set[c.index()][set.index()]
    }

    #[inline]
    pub fn hand(&self, c: Color) -> &Hand {
        &self.hand[c.index()]
    }

    #[inline]
    pub fn king_square(&self, c: Color) -> Square {
        self.king_square[c.index()]
    }

    /// 局面のハッシュ（盤面 ^ 手駒 ^ 手番）
    #[inline]
    pub fn hash(&self) -> u64 {
        let turn = match self.side_to_move {
            Color::Black => 0,
            Color::White => zobrist_turn(),
        };
        self.board_hash ^ self.hand_hash ^ turn
    }

    #[inline]
    pub fn board_hash(&self) -> u64 {
        self.board_hash
    }

    #[inline]
    pub fn hand_hash(&self) -> u64 {
        self.hand_hash
    }

    /// 盤面・手駒のハッシュを最初から計算し直す
    pub fn recompute_hash(&self) -> (u64, u64) {
        let mut board = 0;
        for sq in self.occupied.iter() {
            board ^= zobrist_board(self.piece_on(sq), sq);
        }
        let mut hand = 0;
        for color in Color::ALL {
            hand ^= super::zobrist::hand_hash(color, self.hand(color));
        }
        (board, hand)
    }

    // ========== 駒の配置 ==========

    fn put_piece(&mut self, pc: Piece, sq: Square) {
        debug_assert!(self.piece_on(sq).is_empty());
        let c = pc.color();
        self.board[sq.index()] = pc;
        self.occupied.set(sq);
        for rotated in &mut self.rotated {
            rotated.set(sq);
        }
        self.by_color[c.index()].set(sq);
        match PieceSet::of(pc.piece_type()) {
            Some(set) => self.by_set[c.index()][set.index()].set(sq),
            None => self.king_square[c.index()] = sq,
        }
        self.board_hash ^= zobrist_board(pc, sq);
    }

    fn remove_piece(&mut self, sq: Square) -> Piece {
        let pc = self.piece_on(sq);
        debug_assert!(!pc.is_empty());
        let c = pc.color();
        self.board[sq.index()] = Piece::EMPTY;
        self.occupied.clear(sq);
        for rotated in &mut self.rotated {
            rotated.unset(sq);
        }
        self.by_color[c.index()].clear(sq);
        if let Some(set) = PieceSet::of(pc.piece_type()) {
            self.by_set[c.index()][set.index()].clear(sq);
        }
        self.board_hash ^= zobrist_board(pc, sq);
        pc
    }

    fn add_hand(&mut self, c: Color, pt: PieceType) {
        let n = self.hand[c.index()].increment(pt);
        self.hand_hash ^= zobrist_hand(c, pt, n - 1) ^ zobrist_hand(c, pt, n);
    }

    fn sub_hand(&mut self, c: Color, pt: PieceType) {
        let prev = self.hand[c.index()].decrement(pt);
        self.hand_hash ^= zobrist_hand(c, pt, prev) ^ zobrist_hand(c, pt, prev - 1);
    }

    // ========== 利き ==========

    #[inline]
    pub fn rook_attacks(&self, sq: Square) -> Bitboard {
        line_attacks(Line::File, sq, file_pattern(&self.occupied, sq))
            | line_attacks(Line::Rank, sq, self.rotated[0].pattern(sq))
    }

    #[inline]
    pub fn bishop_attacks(&self, sq: Square) -> Bitboard {
        line_attacks(Line::Diag45, sq, self.rotated[1].pattern(sq))
            | line_attacks(Line::Diag135, sq, self.rotated[2].pattern(sq))
    }

    #[inline]
    pub fn lance_attacks(&self, c: Color, sq: Square) -> Bitboard {
        line_attacks(Line::File, sq, file_pattern(&self.occupied, sq)) & lance_mask(c, sq)
    }

    /// 升sqに置いた駒pcの利き（現在の占有で計算）
    pub fn attacks_from(&self, pc: Piece, sq: Square) -> Bitboard {
        let c = pc.color();
        match pc.piece_type() {
            PieceType::LANCE => self.lance_attacks(c, sq),
            PieceType::BISHOP => self.bishop_attacks(sq),
            PieceType::ROOK => self.rook_attacks(sq),
            PieceType::HORSE => self.bishop_attacks(sq) | king_attacks(sq),
            PieceType::DRAGON => self.rook_attacks(sq) | king_attacks(sq),
            _ => step_reach(pc, sq),
        }
    }

    /// colorの駒のうち1升の利きでsqに届くもの（玉・馬・龍の近接利きを含む）
    pub fn step_attackers(&self, color: Color, sq: Square) -> Bitboard {
        let them = !color;
        let mut near = self.pieces(color, PieceSet::Horse) | self.pieces(color, PieceSet::Dragon);
        let ksq = self.king_square(color);
        if ksq.is_valid() {
            near.set(ksq);
        }
        (pawn_attacks(them, sq) & self.pieces(color, PieceSet::Pawn))
            | (knight_attacks(them, sq) & self.pieces(color, PieceSet::Knight))
            | (silver_attacks(them, sq) & self.pieces(color, PieceSet::Silver))
            | (gold_attacks(them, sq) & self.pieces(color, PieceSet::GoldLike))
            | (king_attacks(sq) & near)
    }

    /// colorの遠方駒のうちsqに利いているもの
    pub fn slider_attackers(&self, color: Color, sq: Square) -> Bitboard {
        let rooks = self.pieces(color, PieceSet::Rook) | self.pieces(color, PieceSet::Dragon);
        let bishops = self.pieces(color, PieceSet::Bishop) | self.pieces(color, PieceSet::Horse);
        (self.rook_attacks(sq) & rooks)
            | (self.bishop_attacks(sq) & bishops)
            | (self.lance_attacks(!color, sq) & self.pieces(color, PieceSet::Lance))
    }

    /// colorの駒のうちsqに利いているもの
    #[inline]
    pub fn attackers_to(&self, color: Color, sq: Square) -> Bitboard {
        self.step_attackers(color, sq) | self.slider_attackers(color, sq)
    }

    /// sqにcolorの利きがあるか
    #[inline]
    pub fn is_attacked(&self, color: Color, sq: Square) -> bool {
        sq.is_valid()
            && (self.step_attackers(color, sq).is_not_empty()
                || self.slider_attackers(color, sq).is_not_empty())
    }

    /// 占有を差し替えたときにcolorの遠方駒がtargetに利くか
    ///
    /// 8方向に盤上をたどり、最初にoccに当たった升の駒で判定する。
    /// `foreign` に含まれる升は遠方駒でない駒が置かれたものとみなす。
    pub(crate) fn sliders_reach_with(
        &self,
        color: Color,
        target: Square,
        occ: Bitboard,
        foreign: Bitboard,
    ) -> bool {
        for dir in Direction::ALL {
            let (df, dr) = dir.delta();
            let mut cur = target;
            while let Some(next) = cur.offset(df, dr) {
                if !occ.contains(next) {
                    cur = next;
                    continue;
                }
                if !foreign.contains(next) {
                    let pc = self.piece_on(next);
                    if pc.is_color(color) && slides_toward(pc, dir.reverse()) {
                        return true;
                    }
                }
                break;
            }
        }
        false
    }

    /// fromの駒を取り除いたときにdir方向（fromの先）に最初に現れる駒の升
    pub(crate) fn first_piece_beyond(&self, from: Square, dir: Direction) -> Option<Square> {
        let (df, dr) = dir.delta();
        let mut cur = from;
        while let Some(next) = cur.offset(df, dr) {
            if self.occupied.contains(next) {
                return Some(next);
            }
            cur = next;
        }
        None
    }

    /// pcがsqからtargetに利くか（vacatedの升は空とみなす）
    fn piece_reaches(&self, pc: Piece, sq: Square, target: Square, vacated: Option<Square>) -> bool {
        if step_reach(pc, sq).contains(target) {
            return true;
        }
        let Some(dir) = direction(sq, target) else {
            return false;
        };
        if !slides_toward(pc, dir) {
            return false;
        }
        let mut blockers = between(sq, target) & self.occupied;
        if let Some(v) = vacated {
            blockers.clear(v);
        }
        blockers.is_empty()
    }

    /// 遠方駒がdir方向（駒から見た方向）に利きを持つか
    #[inline]
    pub(crate) fn is_slider_toward(pc: Piece, dir: Direction) -> bool {
        slides_toward(pc, dir)
    }

    // ========== 王手 ==========

    /// 手番側の玉に対する王手
    pub fn check_state(&self) -> CheckState {
        let us = self.side_to_move;
        let ksq = self.king_square(us);
        let mut state = CheckState::NONE;
        if !ksq.is_valid() {
            return state;
        }
        for sq in self.attackers_to(!us, ksq).iter().take(2) {
            state.push(sq);
        }
        state
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.is_attacked(!self.side_to_move, self.king_square(self.side_to_move))
    }

    /// 指し手が王手になるか（直接王手・開き王手）
    pub fn gives_check(&self, mv: Move) -> bool {
        let us = self.side_to_move;
        let ksq = self.king_square(!us);
        if !ksq.is_valid() {
            return false;
        }
        let to = mv.to();

        if mv.is_drop() {
            let pc = Piece::new(us, mv.drop_piece_type());
            return self.piece_reaches(pc, to, ksq, None);
        }

        let from = mv.from();
        let pc = self.piece_on(from);
        let moved = if mv.is_promotion() { pc.promote() } else { pc };
        if self.piece_reaches(moved, to, ksq, Some(from)) {
            return true;
        }

        // 開き王手: 玉とfromの間が空いていて、toが同じ直線上から外れる
        let Some(dir) = direction(ksq, from) else {
            return false;
        };
        if direction(ksq, to) == Some(dir) || (between(ksq, from) & self.occupied).is_not_empty() {
            return false;
        }
        self.first_piece_beyond(from, dir).is_some_and(|sq| {
            let behind = self.piece_on(sq);
            behind.is_color(us) && slides_toward(behind, dir.reverse())
        })
    }

    /// 手番側がtoに歩を打つと打ち歩詰めになるか
    pub fn is_pawn_drop_mate(&self, to: Square) -> bool {
        let us = self.side_to_move;
        let them = !us;
        let ksq = self.king_square(them);
        if !ksq.is_valid() || !pawn_attacks(us, to).contains(ksq) {
            return false;
        }
        let pawn_bb = Bitboard::from_square(to);
        let occ = self.occupied | pawn_bb;

        // 玉以外の駒で歩を取れるか（取った後に自玉が取られないこと）
        let mut capturers = self.attackers_to(them, to);
        capturers.clear(ksq);
        for sq in capturers.iter() {
            let after = occ.and_not(Bitboard::from_square(sq));
            if !self.sliders_reach_with(us, ksq, after, pawn_bb) {
                return false;
            }
        }

        // 玉の逃げ場（歩を取る手を含む）
        let occ_without_king = occ.and_not(Bitboard::from_square(ksq));
        for sq in king_attacks(ksq).and_not(self.pieces_c(them)).iter() {
            let attacked = if sq == to {
                self.step_attackers(us, sq).is_not_empty()
                    || self.sliders_reach_with(us, sq, occ_without_king, Bitboard::EMPTY)
            } else {
                self.step_attackers(us, sq).is_not_empty()
                    || self.sliders_reach_with(us, sq, occ_without_king, pawn_bb)
            };
            if !attacked {
                return false;
            }
        }
        true
    }

    /// 手番側が詰んでいるか
    pub fn is_mate(&mut self) -> bool {
        if !self.in_check() {
            return false;
        }
        let mut list = MoveList::new();
        generate_evasions(self, &mut list);
        for &mv in &list {
            if let Some(captured) = self.do_move(mv) {
                self.undo_move(mv, captured);
                return false;
            }
        }
        true
    }

    // ========== 指し手の検証 ==========

    /// 駒打ちが可能か（空き升・行き所・二歩）
    pub fn can_drop(&self, pt: PieceType, to: Square) -> bool {
        let us = self.side_to_move;
        if !self.piece_on(to).is_empty() || !drop_rank_allowed(us, pt, to) {
            return false;
        }
        pt != PieceType::PAWN
            || (self.pieces(us, PieceSet::Pawn) & FILE_BB[to.file_index()]).is_empty()
    }

    /// 置換表・キラー手などの指し手がこの局面で擬似合法か
    ///
    /// 自玉への王手放置は判定しない（`do_move` が弾く）。
    pub fn validate_move(&self, mv: Move) -> bool {
        if mv.is_none() {
            return false;
        }
        let us = self.side_to_move;
        let to = mv.to();
        if mv.is_drop() {
            let pt = mv.drop_piece_type();
            if mv.is_promotion() || pt.is_promoted() || pt == PieceType::KING {
                return false;
            }
            return self.hand(us).has(pt)
                && self.can_drop(pt, to)
                && (pt != PieceType::PAWN || !self.is_pawn_drop_mate(to));
        }

        let from = mv.from();
        let pc = self.piece_on(from);
        if !pc.is_color(us) || self.piece_on(to).is_color(us) {
            return false;
        }
        if !self.attacks_from(pc, from).contains(to) {
            return false;
        }
        let (plain, promote) = promotion_options(us, pc.piece_type(), from, to);
        if mv.is_promotion() { promote } else { plain }
    }

    // ========== 指し手実行 ==========

    /// 指し手を実行する
    ///
    /// 自玉が取られる形になる場合は局面を元に戻してNoneを返す。
    /// 成功時は取った駒（なければ `Piece::EMPTY`）を返す。
    pub fn do_move(&mut self, mv: Move) -> Option<Piece> {
        let us = self.side_to_move;
        let to = mv.to();
        let captured;

        if mv.is_drop() {
            let pt = mv.drop_piece_type();
            debug_assert!(self.hand(us).has(pt), "{mv} without piece in hand");
            self.sub_hand(us, pt);
            self.put_piece(Piece::new(us, pt), to);
            captured = Piece::EMPTY;
        } else {
            let from = mv.from();
            debug_assert!(self.piece_on(from).is_color(us), "{mv}: no own piece on {from}");
            captured = self.piece_on(to);
            if !captured.is_empty() {
                debug_assert!(captured.piece_type() != PieceType::KING);
                self.remove_piece(to);
                self.add_hand(us, captured.piece_type().hand_type());
            }
            let pc = self.remove_piece(from);
            let moved = if mv.is_promotion() { pc.promote() } else { pc };
            self.put_piece(moved, to);
        }
        self.side_to_move = !us;

        if self.is_attacked(!us, self.king_square(us)) {
            self.undo_move(mv, captured);
            return None;
        }

        #[cfg(feature = "debug")]
        debug_assert_eq!(self.recompute_hash(), (self.board_hash, self.hand_hash), "{mv}");

        Some(captured)
    }

    /// 指し手を戻す（`do_move` が返した駒を渡す）
    pub fn undo_move(&mut self, mv: Move, captured: Piece) {
        let us = !self.side_to_move;
        self.side_to_move = us;
        let to = mv.to();

        if mv.is_drop() {
            let pc = self.remove_piece(to);
            self.add_hand(us, pc.piece_type());
        } else {
            let moved = self.remove_piece(to);
            let pc = if mv.is_promotion() { moved.unpromote() } else { moved };
            self.put_piece(pc, mv.from());
            if !captured.is_empty() {
                self.sub_hand(us, captured.piece_type().hand_type());
                self.put_piece(captured, to);
            }
        }
    }

    /// パス（手番だけを入れ替える）
    #[inline]
    pub fn do_null_move(&mut self) {
        self.side_to_move = !self.side_to_move;
    }

    #[inline]
    pub fn undo_null_move(&mut self) {
        self.side_to_move = !self.side_to_move;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Position {
    /// CSA形式の盤面
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 1..=9u8 {
            write!(f, "P{rank}")?;
            for file in (1..=9u8).rev() {
                write!(f, "{}", self.piece_on(Square::new(file, rank)))?;
            }
            writeln!(f)?;
        }
        for (color, sign) in [(Color::Black, '+'), (Color::White, '-')] {
            write!(f, "P{sign}")?;
            for pt in PieceType::HAND {
                for _ in 0..self.hand(color).get(pt) {
                    write!(f, "00{pt}")?;
                }
            }
            writeln!(f)?;
        }
        let turn = match self.side_to_move {
            Color::Black => '+',
            Color::White => '-',
        };
        writeln!(f, "{turn}")
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
