//! 探索の統計と結果

use std::time::Duration;

use super::node::Pv;
use crate::types::{Move, Score};

/// 探索の統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub nodes: u64,
    pub quies_nodes: u64,
    pub hash_cut: u64,
    pub null_move_pruning: u64,
    pub futility_pruning: u64,
    pub fail_high: u64,
    /// 最初の指し手でbetaを超えた回数
    pub fail_high_first: u64,
    pub shek_cut: u64,
    pub mate1ply: u64,
}

impl SearchInfo {
    /// 静止探索を含むノード数
    #[inline]
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.quies_nodes
    }

    /// 秒あたりのノード数
    pub fn nps(&self, elapsed: Duration) -> u64 {
        let ms = elapsed.as_millis().max(1) as u64;
        self.total_nodes() * 1000 / ms
    }
}

/// 探索の結果
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// 最善手（合法手がなければ `Move::NONE`）
    pub mv: Move,
    pub score: Score,
    /// 読み終えた深さ（DEPTH_ONE_PLY単位）
    pub depth: i32,
    pub elapsed: Duration,
    pub pv: Pv,
    pub info: SearchInfo,
}

impl SearchResult {
    /// 指せる手がない（投了）
    #[inline]
    pub fn is_resign(&self) -> bool {
        self.mv.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_nodes_and_nps() {
        let info = SearchInfo { nodes: 15, quies_nodes: 7, hash_cut: 2, ..Default::default() };
        assert_eq!(info.total_nodes(), 22);
        assert_eq!(info.nps(Duration::from_millis(11)), 2000);
        assert_eq!(info.nps(Duration::ZERO), 22000);
    }

    #[test]
    fn test_default_result_is_resign() {
        assert!(SearchResult::default().is_resign());
    }
}
