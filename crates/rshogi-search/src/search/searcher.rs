//! 探索本体
//!
//! 反復深化とaspiration window付きのルート探索、null window探索（PVS）、
//! 静止探索。ノードスタックと置換表・History・SHEK表を1つの `Searcher` が持つ。

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::config::{ConfigError, SearchConfig};
use super::handler::{NullSearchHandler, SearchHandler, SearchProgress};
use super::history::{History, moved_piece_type};
use super::info::{SearchInfo, SearchResult};
use super::node::{Node, NodeStat, Pv};
use super::params::*;
use super::time_manager::{TimeManager, Timer};
use crate::eval::{Evaluator, MaterialEvaluator, material};
use crate::mate::mate_1ply;
use crate::movegen::{MoveList, generate_all};
use crate::position::{CheckState, Position};
use crate::see::see;
use crate::shek::{PathEntry, RecordError, RecordHistory, ScrDetector, ScrState, ShekKey};
use crate::shek::{ShekState, ShekTable};
use crate::tt::{Bound, TranspositionTable};
use crate::types::{DEPTH_ONE_PLY, MAX_PLY, Move, Piece, Score};

/// aspiration windowの段階数（最後は窓なし）
const ASP_MAX_INDEX: usize = ASP_WINDOWS.len();

/// Historyを更新するために覚えておく静かな手の数
const QUIETS_TRIED_MAX: usize = 64;

/// 探索器
///
/// 置換表とHistoryは探索をまたいで引き継ぐ。
pub struct Searcher<E: Evaluator = MaterialEvaluator> {
    config: SearchConfig,
    evaluator: E,
    tt: TranspositionTable,
    history: History,
    shek: ShekTable,
    scr: ScrDetector,
    record: RecordHistory,
    time_manager: TimeManager,
    interrupted: Arc<AtomicBool>,
    start: Instant,
    info: SearchInfo,
    position: Position,
    nodes: Vec<Node>,
    ply: usize,
    /// ルートから現局面の親までの局面列
    path: Vec<PathEntry>,
    /// ルートの指し手（拡張領域に前回の評価値）
    root_moves: MoveList,
    rng: Xoshiro256PlusPlus,
}

impl Searcher<MaterialEvaluator> {
    /// 駒割評価で探索器を作る
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        Self::with_evaluator(config, MaterialEvaluator::new())
    }
}

impl<E: Evaluator> Searcher<E> {
    pub fn with_evaluator(config: SearchConfig, evaluator: E) -> Result<Self, ConfigError> {
        config.validate()?;
        debug!(
            "Searcher: tt {}MB, shek 2^{} buckets",
            config.tt_size_mb, config.shek_size_log2
        );
        Ok(Searcher {
            tt: TranspositionTable::new(config.tt_size_mb),
            shek: ShekTable::new(config.shek_size_log2),
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            config,
            evaluator,
            history: History::new(),
            scr: ScrDetector::default(),
            record: RecordHistory::default(),
            time_manager: TimeManager::new(),
            interrupted: Arc::new(AtomicBool::new(false)),
            start: Instant::now(),
            info: SearchInfo::default(),
            position: Position::initial(),
            nodes: (0..MAX_PLY).map(|_| Node::new()).collect(),
            ply: 0,
            path: Vec::with_capacity(MAX_PLY),
            root_moves: MoveList::new(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 設定を変更する（表のサイズが変われば作り直す）
    pub fn set_config(&mut self, config: SearchConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.tt_size_mb != self.config.tt_size_mb {
            debug!("Searcher: resize tt to {}MB", config.tt_size_mb);
            self.tt.resize(config.tt_size_mb);
        }
        if config.shek_size_log2 != self.config.shek_size_log2 {
            self.shek.resize(config.shek_size_log2);
        }
        if config.seed != self.config.seed {
            self.rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        }
        self.config = config;
        Ok(())
    }

    /// ルート以前の棋譜を登録する
    ///
    /// 次の探索から千日手・優越局面・連続王手の判定に使う。
    pub fn set_record(&mut self, initial: &Position, moves: &[Move]) -> Result<(), RecordError> {
        self.record = RecordHistory::replay(initial, moves)?;
        Ok(())
    }

    pub fn clear_record(&mut self) {
        self.record = RecordHistory::default();
    }

    /// 別スレッドから探索を止めるためのフラグ
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Relaxed);
    }

    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// 直前の探索の統計
    #[inline]
    pub fn info(&self) -> &SearchInfo {
        &self.info
    }

    /// 置換表の使用率（‰）
    pub fn hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    // ========== 公開の探索 ==========

    /// 深さ固定の探索
    ///
    /// `depth` は手数。時間制限は使わず、`interrupt_handle` でだけ止まる。
    pub fn search(
        &mut self,
        pos: &Position,
        depth: i32,
        handler: Option<&mut dyn SearchHandler>,
    ) -> SearchResult {
        let mut null = NullSearchHandler;
        let handler: &mut dyn SearchHandler = match handler {
            Some(h) => h,
            None => &mut null,
        };
        self.on_search_started(handler);
        self.init_tree(pos);

        let depth = depth.clamp(1, MAX_PLY as i32) * DEPTH_ONE_PLY;
        let score = self.alpha_beta(depth, -Score::INFINITY, Score::INFINITY, NodeStat::normal());

        let pv = self.nodes[0].pv.clone();
        let elapsed = self.start.elapsed();
        if !pv.is_empty() {
            handler.on_update_pv(&SearchProgress {
                pv: &pv,
                elapsed,
                depth,
                score,
                info: &self.info,
            });
        }
        handler.on_iterate_end(elapsed, depth);

        SearchResult {
            mv: pv.get(0).unwrap_or(Move::NONE),
            score,
            depth,
            elapsed,
            pv,
            info: self.info,
        }
    }

    /// 反復深化探索
    ///
    /// `max_depth` は手数で、設定の `max_depth` で頭打ちにする。
    /// 合法手がなければ `Move::NONE`（投了）を返す。
    pub fn idsearch(
        &mut self,
        pos: &Position,
        max_depth: i32,
        handler: Option<&mut dyn SearchHandler>,
    ) -> SearchResult {
        let mut null = NullSearchHandler;
        let handler: &mut dyn SearchHandler = match handler {
            Some(h) => h,
            None => &mut null,
        };
        self.on_search_started(handler);
        let timer = self
            .config
            .maximum_time_ms
            .map(|ms| Timer::start(Duration::from_millis(ms), Arc::clone(&self.interrupted)));
        self.prepare_idsearch(pos);

        let max_depth = max_depth.clamp(1, self.config.max_depth) * DEPTH_ONE_PLY;
        let mut completed = 0;
        if self.root_moves.is_empty() {
            warn!("idsearch: no legal move\n{}", self.position);
        } else {
            let mut depth = FIRST_DEPTH.min(max_depth);
            loop {
                let cont = self.aspsearch(depth, handler);
                if self.is_interrupted() {
                    break;
                }
                completed = depth;
                info!(
                    "idsearch: depth {} score {} nodes {} pv {}",
                    depth / DEPTH_ONE_PLY,
                    Score::new(i32::from(self.root_moves[0].ext_score())),
                    self.info.total_nodes(),
                    self.nodes[0].pv
                );
                if !cont || depth >= max_depth {
                    break;
                }
                depth = (depth + DEPTH_STEP).min(max_depth);
            }
        }
        drop(timer);

        let elapsed = self.start.elapsed();
        debug!(
            "idsearch: {}ms, nps {}, hashfull {}",
            elapsed.as_millis(),
            self.info.nps(elapsed),
            self.tt.hashfull()
        );

        let Some(&best) = self.root_moves.first() else {
            return SearchResult {
                mv: Move::NONE,
                score: Score::mated_in(0),
                depth: completed,
                elapsed,
                pv: Pv::new(),
                info: self.info,
            };
        };
        let mv = best.without_ext();
        let pv = if self.nodes[0].pv.get(0) == Some(mv) {
            self.nodes[0].pv.clone()
        } else {
            let mut pv = Pv::new();
            pv.set(mv, completed, &Pv::new());
            pv
        };
        // 1回も読み終えていなければ拡張領域は並べ替えの鍵でしかない
        let score = if completed == 0 {
            Score::ZERO
        } else {
            Score::new(i32::from(best.ext_score()))
        };
        SearchResult {
            mv,
            score,
            depth: completed,
            elapsed,
            pv,
            info: self.info,
        }
    }

    // ========== 準備 ==========

    fn on_search_started(&mut self, handler: &mut dyn SearchHandler) {
        self.start = Instant::now();
        self.interrupted.store(false, Ordering::Relaxed);
        self.info = SearchInfo::default();
        self.history.reduce();
        self.tt.evolve();
        let maximum = self.config.maximum_time_ms;
        let optimum = maximum.map(|_| self.config.optimum_time_ms);
        self.time_manager.reset(optimum, maximum);
        handler.on_start();
    }

    /// ノードスタックとSHEK表をルート局面で初期化する
    fn init_tree(&mut self, pos: &Position) {
        self.position = pos.clone();
        self.ply = 0;
        self.path.clear();

        self.shek.clear();
        for key in &self.record.keys {
            self.shek.retain(key);
        }
        self.scr.register(&self.record);

        for node in &mut self.nodes {
            node.killers = [Move::NONE; 2];
        }
        let root = &mut self.nodes[0];
        root.hash = self.position.hash();
        root.material = self.evaluator.evaluate_material(&self.position);
        root.mv = Move::NONE;
        root.captured = Piece::EMPTY;
    }

    fn prepare_idsearch(&mut self, pos: &Position) {
        self.init_tree(pos);
        self.visit();
        self.nodes[0].check_state = self.position.check_state();

        let mut moves = MoveList::new();
        generate_all(&self.position, &mut moves);
        self.root_moves = moves;
        self.sort_root_moves();
    }

    /// ルートの指し手から非合法手を除き、初期の並び順を決める
    fn sort_root_moves(&mut self) {
        let mut moves = std::mem::take(&mut self.root_moves);
        if self.config.random_root {
            moves.shuffle(&mut self.rng);
        }

        let tt_move = self
            .tt
            .probe(self.position.hash())
            .and_then(|entry| Move::deserialize16(entry.move16(), &self.position))
            .unwrap_or(Move::NONE);

        let position = &mut self.position;
        moves.retain(|mv| match position.do_move(*mv) {
            Some(captured) => {
                position.undo_move(*mv, captured);
                true
            }
            None => false,
        });

        for mv in moves.iter_mut() {
            let score = if *mv == tt_move {
                Score::INFINITY
            } else if mv.is_promotion() {
                see(&self.position, *mv) + 1
            } else {
                see(&self.position, *mv)
            };
            mv.set_ext_score(score.raw() as i16);
        }
        moves.sort_by_key(|mv| Reverse(mv.ext_score()));
        self.root_moves = moves;
    }

    // ========== ルート ==========

    /// 1回の反復
    ///
    /// 評価値が詰みでなければ次の反復を続けるべきとしてtrueを返す。
    fn aspsearch(&mut self, depth: i32, handler: &mut dyn SearchHandler) -> bool {
        let do_asp = depth >= ASP_MIN_DEPTH;
        let prev = Score::new(i32::from(self.root_moves[0].ext_score()));
        let alphas = [prev - ASP_WINDOWS[0], prev - ASP_WINDOWS[1], -Score::INFINITY];
        let betas = [prev + ASP_WINDOWS[0], prev + ASP_WINDOWS[1], Score::INFINITY];
        let mut alpha_index = if do_asp { 0 } else { ASP_MAX_INDEX };
        let mut beta_index = alpha_index;

        for mv in self.root_moves.iter_mut().skip(1) {
            mv.set_ext_score(-Score::INFINITY.raw() as i16);
        }

        let in_check = self.nodes[0].check_state.is_check();
        let mut best_score = -Score::INFINITY;
        let mut pv_stored = false;
        let mut full_search = true;
        let mut move_count = 0;

        while move_count < self.root_moves.len() {
            let alpha = alphas[alpha_index].max(best_score);
            let beta = betas[beta_index];
            let mv = self.root_moves[move_count].without_ext();

            let mut new_depth = depth - DEPTH_ONE_PLY;
            let mut reduced = 0;
            if !full_search && new_depth >= DEPTH_ONE_PLY && !in_check && !self.is_tactical(mv) {
                let ratio = self.history.ratio(
                    self.position.side_to_move(),
                    moved_piece_type(&self.position, mv),
                    mv,
                );
                reduced = reduction(new_depth, move_count + 1, ratio, true, true);
                new_depth -= reduced;
            }

            if !self.do_move(mv) {
                warn!("aspsearch: illegal root move {mv}");
                self.root_moves.remove(move_count);
                continue;
            }
            let score = if full_search {
                -self.alpha_beta(new_depth, -beta, -alpha, NodeStat::normal())
            } else {
                let mut score =
                    -self.alpha_beta(new_depth, -(alpha + 1), -alpha, NodeStat::normal());
                if !self.is_interrupted() && score > alpha && (reduced != 0 || score < beta) {
                    new_depth += reduced;
                    score = -self.alpha_beta(new_depth, -beta, -alpha, NodeStat::normal());
                }
                score
            };
            self.undo_move();
            if self.is_interrupted() {
                break;
            }

            // fail-low
            if score <= alphas[alpha_index] && alpha_index < ASP_MAX_INDEX && score > best_score {
                while alpha_index < ASP_MAX_INDEX && score <= alphas[alpha_index] {
                    alpha_index += 1;
                }
                if alphas[alpha_index] < score {
                    debug!("aspsearch: fail-low {mv} {score}");
                    let mut pv = Pv::new();
                    pv.set(mv, depth, &self.nodes[1].pv);
                    handler.on_fail_low(&SearchProgress {
                        pv: &pv,
                        elapsed: self.start.elapsed(),
                        depth,
                        score,
                        info: &self.info,
                    });
                    full_search = true;
                    continue;
                }
            }

            self.root_moves[move_count].set_ext_score(score.raw() as i16);
            if score > alpha {
                self.update_pv(mv, depth);
                pv_stored = true;
            }

            // fail-high
            if score >= beta && beta_index < ASP_MAX_INDEX {
                while beta_index < ASP_MAX_INDEX && score >= betas[beta_index] {
                    beta_index += 1;
                }
                if betas[beta_index] > score {
                    debug!("aspsearch: fail-high {mv} {score}");
                    handler.on_fail_high(&SearchProgress {
                        pv: &self.nodes[0].pv,
                        elapsed: self.start.elapsed(),
                        depth,
                        score,
                        info: &self.info,
                    });
                    full_search = true;
                    continue;
                }
            }

            let elapsed = self.start.elapsed();
            if score > best_score {
                best_score = score;
                handler.on_update_pv(&SearchProgress {
                    pv: &self.nodes[0].pv,
                    elapsed,
                    depth,
                    score,
                    info: &self.info,
                });
            }

            self.time_manager.update(
                elapsed.as_millis() as u64,
                depth,
                best_score,
                &self.nodes[0].pv,
            );
            if self.time_manager.should_interrupt() {
                self.interrupt();
                break;
            }

            move_count += 1;
            full_search = false;
        }

        // 安定ソートで同点の指し手の順番を保つ
        self.root_moves.sort_by_key(|mv| Reverse(mv.ext_score()));

        if pv_stored {
            self.store_pv();
        }

        handler.on_iterate_end(self.start.elapsed(), depth);

        !best_score.is_mate()
    }

    // ========== 通常の探索 ==========

    fn alpha_beta(&mut self, depth: i32, alpha: Score, beta: Score, mut stat: NodeStat) -> Score {
        let ply = self.ply;
        self.visit();

        if let Some(score) = self.check_shek() {
            return score;
        }

        if depth < DEPTH_ONE_PLY {
            return self.qsearch(0, alpha, beta);
        }

        self.info.nodes += 1;

        if ply >= MAX_PLY - PLY_MARGIN {
            self.nodes[ply].is_historical = true;
            return self.stand_pat();
        }

        // 詰みまでの距離による枝刈り
        let lower = Score::mated_in(ply as i32);
        let upper = Score::mate_in(ply as i32 + 1);
        if lower >= beta {
            return lower;
        }
        if upper <= alpha {
            return upper;
        }

        let null_window = alpha + 1 == beta;
        let check_state = self.position.check_state();
        self.nodes[ply].check_state = check_state;
        let in_check = check_state.is_check();
        let hash = self.nodes[ply].hash;

        // 置換表
        let mut tt_move = Move::NONE;
        if let Some(entry) = self.tt.probe(hash) {
            let tt_score = entry.score(ply as i32);
            let tt_depth = entry.depth();
            let bound = entry.bound();
            let is_mate = (tt_score.is_loss() && bound.is_upper())
                || (tt_score.is_win() && bound.is_lower());

            if stat.has(NodeStat::HASH_CUT)
                && null_window
                && (tt_depth >= depth || is_mate)
                && (if tt_score <= alpha { bound.is_upper() } else { bound.is_lower() })
            {
                if !in_check
                    && let Some(mv) = Move::deserialize16(entry.move16(), &self.position)
                    && self.position.validate_move(mv)
                    && !self.is_tactical(mv)
                {
                    self.update_history(mv, tt_depth);
                }
                self.info.hash_cut += 1;
                return tt_score;
            }

            if depth < RECURSIVE_ID_MIN_DEPTH || tt_depth >= recursive_id_depth(depth) {
                if tt_score < beta && bound == Bound::Upper {
                    stat.unset(NodeStat::NULL_MOVE_SEARCH);
                }
                if let Some(mv) = Move::deserialize16(entry.move16(), &self.position)
                    && self.position.validate_move(mv)
                {
                    tt_move = mv;
                }
            }

            if entry.is_mate_threat() {
                stat.set(NodeStat::MATE_THREAT);
            }
        }

        if stat.has(NodeStat::MATE_DETECTION)
            && !in_check
            && let Some(mv) = mate_1ply(&mut self.position)
        {
            self.info.mate1ply += 1;
            self.nodes[ply].pv.set(mv, depth, &Pv::new());
            return Score::mate_in(ply as i32 + 1);
        }

        let stand_pat = self.stand_pat();
        self.nodes[ply].static_eval = (!in_check).then_some(stand_pat);

        // ノード単位のfutility pruning
        if !in_check && depth < FUT_MAX_DEPTH {
            let score = stand_pat - futility_margin(depth, 0);
            if score >= beta {
                self.info.futility_pruning += 1;
                return score;
            }
        }

        // null move pruning
        if null_window
            && stand_pat >= beta
            && stat.has(NodeStat::NULL_MOVE_SEARCH)
            && !in_check
            && !stat.has(NodeStat::MATE_THREAT)
        {
            let new_depth = null_depth(depth, stand_pat, beta);
            let child_stat = NodeStat::normal().without(NodeStat::NULL_MOVE_SEARCH);

            self.do_null_move();
            let score = if new_depth < DEPTH_ONE_PLY {
                -self.qsearch(0, -beta, -beta + 1)
            } else {
                -self.alpha_beta(new_depth, -beta, -beta + 1, child_stat)
            };
            self.undo_null_move();
            if self.is_interrupted() {
                return Score::ZERO;
            }

            if score >= beta {
                let historical = self.nodes[ply + 1].is_historical;
                self.nodes[ply].is_historical = historical;
                self.info.null_move_pruning += 1;
                if !historical {
                    self.tt.store(hash, alpha, beta, score, depth, ply as i32, Move::NONE, false);
                }
                return score;
            }
            if score.is_loss() {
                stat.set(NodeStat::MATE_THREAT);
            }
        }

        // 多重反復深化
        if depth >= RECURSIVE_ID_MIN_DEPTH
            && tt_move.is_none()
            && stat.has(NodeStat::RECURSIVE_ID_SEARCH)
            && !in_check
        {
            let child_stat = NodeStat::normal()
                .without(NodeStat::NULL_MOVE_SEARCH)
                .without(NodeStat::HASH_CUT)
                .without(NodeStat::MATE_DETECTION);
            self.alpha_beta(recursive_id_depth(depth), alpha, beta, child_stat);
            if self.is_interrupted() {
                return Score::ZERO;
            }
            self.revisit(check_state, stand_pat);

            if let Some(entry) = self.tt.probe(hash)
                && let Some(mv) = Move::deserialize16(entry.move16(), &self.position)
                && self.position.validate_move(mv)
            {
                tt_move = mv;
            }
        }

        let turn = self.position.side_to_move();
        let improving = self.is_improving();
        let killers = self.nodes[ply].killers;
        self.nodes[ply].picker.init_main(tt_move, killers, in_check);

        let mut best_score = lower;
        let mut best_move = Move::NONE;
        let mut is_first = true;
        let mut move_count = 0;

        while let Some(mv) = self.nodes[ply].picker.next(&mut self.position, &self.history) {
            let mv = mv.without_ext();
            move_count += 1;

            let gives_check = self.position.gives_check(mv);
            let tactical = self.is_tactical(mv);
            let prior = self.nodes[ply].picker.is_prior_move(mv);
            let mut child_stat = NodeStat::normal();

            // 延長
            let mut new_depth = depth - DEPTH_ONE_PLY;
            if gives_check {
                new_depth += EXT_CHECK;
            } else if is_first && in_check && self.nodes[ply].picker.evasion_count() == Some(1) {
                new_depth += EXT_ONE_REPLY;
            } else if !in_check && stat.has(NodeStat::RECAPTURE_EXTENSION) && self.is_recapture(mv)
            {
                new_depth += EXT_RECAPTURE;
                stat.unset(NodeStat::RECAPTURE_EXTENSION);
                child_stat.unset(NodeStat::RECAPTURE_EXTENSION);
            }

            // late move reduction
            let mut reduced = 0;
            if !is_first
                && new_depth >= DEPTH_ONE_PLY
                && !in_check
                && !tactical
                && !prior
                && !stat.has(NodeStat::MATE_THREAT)
            {
                let ratio = self.history.ratio(turn, moved_piece_type(&self.position, mv), mv);
                reduced = reduction(new_depth, move_count, ratio, !null_window, improving);
                new_depth -= reduced;
            }

            let new_alpha = alpha.max(best_score);

            // futility pruning
            if !gives_check
                && !in_check
                && new_depth < FUT_MAX_DEPTH
                && new_alpha > -Score::MATE
                && !prior
            {
                let score = self.estimate_score(stand_pat, mv)
                    + futility_margin(new_depth.max(0), move_count);
                if score <= new_alpha {
                    is_first = false;
                    best_score = best_score.max(score);
                    self.info.futility_pruning += 1;
                    continue;
                }
            }

            // SEEが負の静かな手
            if !is_first
                && !gives_check
                && !in_check
                && !tactical
                && !prior
                && new_depth < SEE_PRUNING_DEPTH
                && see(&self.position, mv) < Score::ZERO
            {
                continue;
            }

            if !self.do_move(mv) {
                move_count -= 1;
                continue;
            }
            let score = if is_first {
                -self.alpha_beta(new_depth, -beta, -new_alpha, child_stat)
            } else {
                let mut score =
                    -self.alpha_beta(new_depth, -(new_alpha + 1), -new_alpha, child_stat);
                if !self.is_interrupted() && score > new_alpha && (reduced != 0 || score < beta) {
                    new_depth += reduced;
                    score = -self.alpha_beta(new_depth, -beta, -new_alpha, child_stat);
                }
                score
            };
            self.undo_move();
            if self.is_interrupted() {
                return Score::ZERO;
            }

            if !tactical && self.nodes[ply].quiets_tried.len() < QUIETS_TRIED_MAX {
                self.nodes[ply].quiets_tried.push(mv);
            }

            let child_historical = self.nodes[ply + 1].is_historical;
            if score > best_score {
                best_score = score;
                best_move = mv;
                if score >= beta {
                    self.nodes[ply].is_historical = child_historical;
                    self.info.fail_high += 1;
                    if is_first {
                        self.info.fail_high_first += 1;
                    }
                    break;
                }
                self.update_pv(mv, depth);
            }
            self.nodes[ply].is_historical |= child_historical;
            is_first = false;
        }

        if best_move.is_some() && !in_check && !self.is_capture(best_move) {
            if !best_move.is_promotion() {
                self.nodes[ply].add_killer(best_move);
            }
            self.update_history(best_move, depth);
        }

        if !self.nodes[ply].is_historical {
            self.tt.store(
                hash,
                alpha,
                beta,
                best_score,
                depth,
                ply as i32,
                best_move,
                stat.has(NodeStat::MATE_THREAT),
            );
        }

        best_score
    }

    /// 静止探索（`depth` は0から1手ごとに `DEPTH_ONE_PLY` ずつ減る）
    fn qsearch(&mut self, depth: i32, alpha: Score, beta: Score) -> Score {
        let ply = self.ply;
        self.visit();
        self.info.quies_nodes += 1;

        let check_state = self.position.check_state();
        self.nodes[ply].check_state = check_state;
        let in_check = check_state.is_check();
        let stand_pat = self.stand_pat();

        let mut best_score = alpha;
        if !in_check {
            self.nodes[ply].static_eval = Some(stand_pat);
            if stand_pat > best_score {
                best_score = stand_pat;
                if best_score >= beta {
                    return best_score;
                }
            }
        } else {
            best_score = best_score.max(Score::mated_in(ply as i32));
        }

        if ply >= MAX_PLY - PLY_MARGIN {
            self.nodes[ply].is_historical = true;
            return stand_pat;
        }

        let hash = self.nodes[ply].hash;
        if alpha + 1 == beta
            && let Some(entry) = self.tt.probe(hash)
        {
            let tt_score = entry.score(ply as i32);
            let bound = entry.bound();
            let is_mate = (tt_score.is_loss() && bound.is_upper())
                || (tt_score.is_win() && bound.is_lower());
            let usable = match bound {
                Bound::Exact => true,
                Bound::Upper => tt_score <= best_score,
                Bound::Lower => tt_score >= beta,
                Bound::None => false,
            };
            if usable && (entry.depth() >= depth || is_mate) {
                self.info.hash_cut += 1;
                return tt_score;
            }
        }

        if !in_check && let Some(mv) = mate_1ply(&mut self.position) {
            self.info.mate1ply += 1;
            self.nodes[ply].pv.set(mv, 0, &Pv::new());
            return Score::mate_in(ply as i32 + 1);
        }

        let exclude_small = depth <= QUIES_EXCLUDE_SMALL_DEPTH;
        self.nodes[ply].picker.init_quies(in_check, exclude_small);

        while let Some(mv) = self.nodes[ply].picker.next(&mut self.position, &self.history) {
            let mv = mv.without_ext();
            if !in_check
                && !self.position.gives_check(mv)
                && self.estimate_score(stand_pat, mv) + QUIES_FUT_MARGIN <= alpha
            {
                self.info.futility_pruning += 1;
                continue;
            }

            if !self.do_move(mv) {
                continue;
            }
            let score = -self.qsearch(depth - DEPTH_ONE_PLY, -beta, -best_score);
            self.undo_move();
            if self.is_interrupted() {
                return Score::ZERO;
            }

            let child_historical = self.nodes[ply + 1].is_historical;
            self.nodes[ply].is_historical |= child_historical;
            if score > best_score {
                best_score = score;
                self.update_pv(mv, 0);
                if score >= beta {
                    break;
                }
            }
        }

        if !self.nodes[ply].is_historical {
            self.tt.store(hash, alpha, beta, best_score, depth, ply as i32, Move::NONE, false);
        }

        best_score
    }

    /// SHEK表と連続王手の判定
    ///
    /// 評価値が経路で決まる場合はそれを返す。ルートでは調べない。
    fn check_shek(&mut self) -> Option<Score> {
        let ply = self.ply;
        if ply == 0 {
            return None;
        }
        let mate = Score::mate_in(ply as i32);
        let mated = Score::mated_in(ply as i32);
        let score = match self.shek.check(&ShekKey::of(&self.position)) {
            ShekState::None => return None,
            ShekState::Superior => mate,
            ShekState::Inferior => mated,
            ShekState::Equal4 => {
                match self.scr.detect(&self.path, self.position.hash()) {
                    ScrState::Win => mate,
                    ScrState::Lose => mated,
                    ScrState::Draw | ScrState::None => Score::ZERO,
                }
            }
            // 探索中の繰り返しは連続王手のときだけ勝敗を決める
            ShekState::Equal => match self.scr.detect_short(&self.path, self.position.hash()) {
                ScrState::Win => mate,
                ScrState::Lose => mated,
                ScrState::Draw | ScrState::None => return None,
            },
        };
        self.nodes[ply].is_historical = true;
        self.info.shek_cut += 1;
        Some(score)
    }

    // ========== ノードスタック ==========

    fn visit(&mut self) {
        let node = &mut self.nodes[self.ply];
        node.is_historical = false;
        node.static_eval = None;
        node.quiets_tried.clear();
        node.pv.clear();
    }

    /// 同じplyでの浅い探索の後にノードを元の状態に戻す
    fn revisit(&mut self, check_state: CheckState, stand_pat: Score) {
        self.visit();
        let node = &mut self.nodes[self.ply];
        node.check_state = check_state;
        node.static_eval = (!check_state.is_check()).then_some(stand_pat);
    }

    fn do_move(&mut self, mv: Move) -> bool {
        let ply = self.ply;
        let key = ShekKey::of(&self.position);
        let Some(captured) = self.position.do_move(mv) else {
            return false;
        };
        self.shek.retain(&key);

        let node = &mut self.nodes[ply];
        node.mv = mv;
        node.captured = captured;
        self.path.push(PathEntry { hash: node.hash, in_check: node.check_state.is_check() });

        let material =
            self.evaluator.evaluate_diff(self.nodes[ply].material, &self.position, mv, captured);
        let child = &mut self.nodes[ply + 1];
        child.hash = self.position.hash();
        child.material = material;
        self.ply += 1;
        true
    }

    fn undo_move(&mut self) {
        self.ply -= 1;
        let node = &self.nodes[self.ply];
        self.position.undo_move(node.mv, node.captured);
        self.path.pop();
        self.shek.release(&ShekKey::of(&self.position));
    }

    fn do_null_move(&mut self) {
        let ply = self.ply;
        let node = &mut self.nodes[ply];
        node.mv = Move::NONE;
        node.captured = Piece::EMPTY;
        self.path.push(PathEntry { hash: node.hash, in_check: false });
        let material = node.material;

        self.position.do_null_move();
        let child = &mut self.nodes[ply + 1];
        child.hash = self.position.hash();
        child.material = material;
        self.ply += 1;
    }

    fn undo_null_move(&mut self) {
        self.ply -= 1;
        self.position.undo_null_move();
        self.path.pop();
    }

    /// 子ノードの読み筋に指し手をつなげる
    fn update_pv(&mut self, mv: Move, depth: i32) {
        let ply = self.ply;
        let (head, tail) = self.nodes.split_at_mut(ply + 1);
        head[ply].pv.set(mv, depth, &tail[0].pv);
    }

    /// ルートの読み筋の指し手を置換表に書き込む
    fn store_pv(&mut self) {
        let pv = self.nodes[0].pv.clone();
        let mut done = 0;
        for (i, mv) in pv.moves().enumerate() {
            let depth = pv.depth(i).unwrap_or(0);
            if depth <= 0 {
                break;
            }
            let hash = self.position.hash();
            if !self.position.validate_move(mv) || !self.do_move(mv) {
                warn!("store_pv: illegal move {mv} in {pv}");
                break;
            }
            self.tt.store_pv(hash, depth, mv);
            done += 1;
        }
        for _ in 0..done {
            self.undo_move();
        }
    }

    fn update_history(&mut self, best: Move, depth: i32) {
        let d = depth / DEPTH_ONE_PLY;
        let value = ((d + 1) * (d + 1) - 3).max(1) as u32;
        let turn = self.position.side_to_move();
        let node = &self.nodes[self.ply];
        for &mv in &node.quiets_tried {
            let good = if mv == best { value } else { 0 };
            self.history.add(turn, moved_piece_type(&self.position, mv), mv, value, good);
        }
        if !node.quiets_tried.contains(&best) {
            self.history.add(turn, moved_piece_type(&self.position, best), best, value, value);
        }
    }

    // ========== 補助 ==========

    #[inline]
    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Relaxed)
    }

    /// 手番側から見た静的評価
    #[inline]
    fn stand_pat(&self) -> Score {
        self.evaluator.evaluate(self.nodes[self.ply].material, &self.position)
    }

    /// 2手前より静的評価が良くなっているか（不明ならtrue）
    fn is_improving(&self) -> bool {
        if self.ply < 2 {
            return true;
        }
        match (self.nodes[self.ply].static_eval, self.nodes[self.ply - 2].static_eval) {
            (Some(now), Some(before)) => now >= before,
            _ => true,
        }
    }

    #[inline]
    fn is_capture(&self, mv: Move) -> bool {
        !self.position.piece_on(mv.to()).is_empty()
    }

    /// 駒取りか成り
    #[inline]
    fn is_tactical(&self, mv: Move) -> bool {
        mv.is_promotion() || self.is_capture(mv)
    }

    /// 直前に駒を取られた升で取り返す手か
    fn is_recapture(&self, mv: Move) -> bool {
        if self.ply == 0 {
            return false;
        }
        let parent = &self.nodes[self.ply - 1];
        parent.mv.is_some() && !parent.captured.is_empty() && parent.mv.to() == mv.to()
    }

    /// 指した後の静的評価の概算
    fn estimate_score(&self, stand_pat: Score, mv: Move) -> Score {
        let mut score = stand_pat;
        let captured = self.position.piece_on(mv.to());
        if !captured.is_empty() {
            score += material::exchange_score(captured.piece_type());
        }
        if mv.is_promotion() {
            score += material::promotion_score(self.position.piece_on(mv.from()).piece_type());
        }
        score
    }
}
