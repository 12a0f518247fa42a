//! 汎用ハッシュ表
//!
//! サイズ2のべき乗のバケット配列。ハッシュ値の下位ビットでバケットを選び、
//! バケット内の連想は要素型（置換表・SHEK表）が受け持つ。

/// ハッシュ表のバケット
pub trait Bucket: Default + Clone {
    /// バケットの全スロットを空にする
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 2^bits 個のバケットを持つハッシュ表
pub struct HashTable<B: Bucket> {
    buckets: Vec<B>,
    mask: u64,
}

impl<B: Bucket> HashTable<B> {
    pub const DEFAULT_BITS: u32 = 18;

    pub fn new(bits: u32) -> Self {
        let len = 1usize << bits;
        HashTable { buckets: vec![B::default(); len], mask: len as u64 - 1 }
    }

    /// サイズを変更する（内容は失われる）
    pub fn resize(&mut self, bits: u32) {
        let len = 1usize << bits;
        if len != self.buckets.len() {
            *self = Self::new(bits);
        } else {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// バケット数
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// バケット数のlog2
    #[inline]
    pub fn bits(&self) -> u32 {
        self.buckets.len().trailing_zeros()
    }

    #[inline]
    pub fn bucket(&self, hash: u64) -> &B {
        &self.buckets[(hash & self.mask) as usize]
    }

    #[inline]
    pub fn bucket_mut(&mut self, hash: u64) -> &mut B {
        &mut self.buckets[(hash & self.mask) as usize]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, B> {
        self.buckets.iter()
    }
}

impl<B: Bucket> Default for HashTable<B> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BITS)
    }
}
