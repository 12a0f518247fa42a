//! TranspositionTable本体
//!
//! - TTBucket: 1キャッシュラインに収まるエントリのグループ
//! - TranspositionTable: テーブル本体（store / store_pv / probe）

use log::{debug, warn};

use super::entry::{AGE_MASK, Bound, TTEntry, score_to_tt};
use super::{BUCKET_SIZE, TTStatus};
use crate::table::{Bucket, HashTable};
use crate::types::{Move, Score};

/// バケット
/// 16bytes × 4 = 64bytes（キャッシュライン）
#[derive(Debug, Clone, Copy, Default)]
#[repr(C, align(64))]
pub struct TTBucket {
    entries: [TTEntry; BUCKET_SIZE],
}

const _: () = assert!(std::mem::size_of::<TTBucket>() == 64);

impl Bucket for TTBucket {}

impl TTBucket {
    fn find(&self, hash: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.matches(hash))
    }

    /// 置き換える枠を選ぶ（空き・古い世代を優先し、次に深さの浅いもの）
    fn victim(&self, age: u8) -> usize {
        let mut best = 0;
        let mut best_key = i32::MAX;
        for (i, e) in self.entries.iter().enumerate() {
            let key = if !e.is_live() {
                -2
            } else if e.age() != age {
                -1
            } else {
                e.depth()
            };
            if key < best_key {
                best_key = key;
                best = i;
            }
        }
        best
    }
}

/// 置換表
pub struct TranspositionTable {
    table: HashTable<TTBucket>,
    age: u8,
}

const BUCKETS_PER_MB: usize = 1024 * 1024 / std::mem::size_of::<TTBucket>();

/// size_mb に収まるバケット数のlog2
fn bits_for(size_mb: usize) -> u32 {
    let size_mb = if size_mb == 0 {
        warn!("transposition table size 0MB is not allowed; using 1MB");
        1
    } else {
        size_mb
    };
    let buckets = size_mb.saturating_mul(BUCKETS_PER_MB);
    let bits = usize::BITS - 1 - buckets.leading_zeros();
    if !buckets.is_power_of_two() {
        warn!(
            "transposition table size {size_mb}MB rounded down to {}MB",
            (1usize << bits) / BUCKETS_PER_MB
        );
    }
    bits
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    pub fn new(size_mb: usize) -> Self {
        let bits = bits_for(size_mb);
        debug!("transposition table: {} buckets", 1usize << bits);
        Self { table: HashTable::new(bits), age: 1 }
    }

    /// サイズを変更（内容は消える）
    pub fn resize(&mut self, size_mb: usize) {
        let bits = bits_for(size_mb);
        debug!("transposition table resized: {} -> {} buckets", self.table.len(), 1usize << bits);
        self.table.resize(bits);
        self.age = 1;
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.age = 1;
    }

    /// 世代を進める（探索開始ごと）
    pub fn evolve(&mut self) {
        self.age = self.age % AGE_MASK as u8 + 1;
    }

    #[inline]
    pub fn age(&self) -> u8 {
        self.age
    }

    /// バケット数
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.len()
    }

    /// 探索結果を格納する
    ///
    /// 評価値の種類は窓(alpha, beta)から決める。詰みスコアはplyを使って
    /// 「この局面からの手数」に直して格納する。
    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        hash: u64,
        alpha: Score,
        beta: Score,
        score: Score,
        depth: i32,
        ply: i32,
        mv: Move,
        mate_threat: bool,
    ) -> TTStatus {
        let age = self.age;
        let bound = Bound::classify(score, alpha, beta);
        let stored = score_to_tt(score.clamp_to_infinity(), ply);
        let bucket = self.table.bucket_mut(hash);

        if let Some(i) = bucket.find(hash) {
            let old = bucket.entries[i];
            if depth < old.depth() && !stored.is_mate() && !old.is_mate_resolved() {
                return TTStatus::Reject;
            }
            let move16 = if mv.is_none() { old.move16() } else { mv.serialize16() };
            let threat = mate_threat || old.is_mate_threat();
            bucket.entries[i] = TTEntry::pack(hash, age, move16, stored, bound, depth, threat);
            return TTStatus::Update;
        }

        let i = bucket.victim(age);
        let status = if bucket.entries[i].is_live() { TTStatus::Collide } else { TTStatus::New };
        bucket.entries[i] =
            TTEntry::pack(hash, age, mv.serialize16(), stored, bound, depth, mate_threat);
        status
    }

    /// 読み筋の指し手だけを書き込む
    ///
    /// 既にエントリがあれば指し手と世代だけを更新し、評価値は残す。
    pub fn store_pv(&mut self, hash: u64, depth: i32, mv: Move) -> TTStatus {
        let age = self.age;
        let bucket = self.table.bucket_mut(hash);
        if let Some(i) = bucket.find(hash) {
            let old = bucket.entries[i];
            bucket.entries[i] = TTEntry::pack(
                hash,
                age,
                mv.serialize16(),
                old.raw_score(),
                old.bound(),
                old.depth(),
                old.is_mate_threat(),
            );
            return TTStatus::Update;
        }
        let i = bucket.victim(age);
        let status = if bucket.entries[i].is_live() { TTStatus::Collide } else { TTStatus::New };
        bucket.entries[i] =
            TTEntry::pack(hash, age, mv.serialize16(), Score::ZERO, Bound::None, depth, false);
        status
    }

    /// エントリを探す
    ///
    /// 見つかったエントリは現在の世代に付け替える。
    pub fn probe(&mut self, hash: u64) -> Option<TTEntry> {
        let age = self.age;
        let bucket = self.table.bucket_mut(hash);
        let i = bucket.find(hash)?;
        let entry = &mut bucket.entries[i];
        if entry.age() != age {
            *entry = entry.with_age(age);
        }
        Some(*entry)
    }

    /// 使用率（‰）
    ///
    /// 先頭1000バケットのうち現在の世代のエントリが占める割合。
    pub fn hashfull(&self) -> u32 {
        let sample = self.table.len().min(1000);
        let used: usize = self
            .table
            .iter()
            .take(sample)
            .map(|b| b.entries.iter().filter(|e| e.is_live() && e.age() == self.age).count())
            .sum();
        (used * 1000 / (sample * BUCKET_SIZE)) as u32
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(super::DEFAULT_SIZE_MB)
    }
}
