//! Generic keyed record store backed by a chained hash table.
//!
//! `RecordIndex` is used twice by the library: books keyed by title and
//! users keyed by id. Keys hash into a bucket; each bucket is a short
//! vector of `(key, value)` pairs searched linearly. The table doubles its
//! bucket count once the average chain grows past [`MAX_LOAD`] entries, so
//! lookups stay O(1) on average.

use std::{
    borrow::Borrow,
    collections::hash_map::DefaultHasher,
    hash::{BuildHasher, BuildHasherDefault, Hash},
};

use thiserror::Error;

/// Bucket count used by [`RecordIndex::new`].
pub const DEFAULT_BUCKETS: usize = 101;

/// Average entries per bucket tolerated before the table grows.
pub const MAX_LOAD: usize = 2;

/// Errors reported by [`RecordIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The key is already present; the existing value was left untouched.
    #[error("duplicate key")]
    DuplicateKey,
}

/// One hash chain.
type Bucket<K, V> = Vec<(K, V)>;

/// Associative container keyed by any hashable identifier
#[derive(Debug, Clone)]
pub struct RecordIndex<K, V, S = BuildHasherDefault<DefaultHasher>> {
    /// Hash chains, never empty
    buckets: Vec<Bucket<K, V>>,
    /// Number of stored entries
    len: usize,
    /// Builds the deterministic hasher for keys
    hasher: S,
}

impl<K, V> RecordIndex<K, V> {
    /// Create an empty index with [`DEFAULT_BUCKETS`] buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Create an empty index with the given initial bucket count (at least one).
    #[must_use]
    pub fn with_buckets(buckets: usize) -> Self {
        Self::with_buckets_and_hasher(buckets, BuildHasherDefault::default())
    }
}

impl<K, V> Default for RecordIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RecordIndex<K, V, S> {
    /// Create an empty index using a caller-supplied hasher builder.
    #[must_use]
    pub fn with_buckets_and_hasher(buckets: usize, hasher: S) -> Self {
        let count = buckets.max(1);
        let mut table = Vec::with_capacity(count);
        table.resize_with(count, Vec::new);
        Self { buckets: table, len: 0, hasher }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of hash chains.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate over every `(key, value)` pair in unspecified order.
    ///
    /// The iterator is lazy and borrows the index; call again to restart.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets.iter().flat_map(|bucket| bucket.iter().map(|(k, v)| (k, v)))
    }

    /// Iterate over every stored value in unspecified order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Mutable iteration over every stored value in unspecified order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.buckets.iter_mut().flat_map(|bucket| bucket.iter_mut().map(|(_, v)| v))
    }
}

impl<K, V, S> RecordIndex<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Chain index for a key.
    fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let count = u64::try_from(self.buckets.len()).unwrap_or(u64::MAX);
        let slot = hash.checked_rem(count).unwrap_or(0);
        usize::try_from(slot).unwrap_or(0)
    }

    /// Insert a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateKey`] if `key` is already present. The
    /// stored value is not replaced.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), IndexError> {
        if self.contains_key(&key) {
            return Err(IndexError::DuplicateKey);
        }
        if self.len >= self.buckets.len().saturating_mul(MAX_LOAD) {
            self.grow();
        }
        let slot = self.bucket_of(&key);
        if let Some(bucket) = self.buckets.get_mut(slot) {
            bucket.push((key, value));
            self.len = self.len.saturating_add(1);
        }
        Ok(())
    }

    /// Look up a value by key.
    #[must_use]
    pub fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(self.bucket_of(key))?
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    /// Look up a value by key for mutation.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.bucket_of(key);
        self.buckets
            .get_mut(slot)?
            .iter_mut()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Remove an entry and return its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.bucket_of(key);
        let bucket = self.buckets.get_mut(slot)?;
        let pos = bucket.iter().position(|(k, _)| k.borrow() == key)?;
        let (_, value) = bucket.swap_remove(pos);
        self.len = self.len.saturating_sub(1);
        Some(value)
    }

    /// Double the bucket count and redistribute every entry.
    fn grow(&mut self) {
        let count = self.buckets.len().saturating_mul(2).max(1);
        let mut table = Vec::with_capacity(count);
        table.resize_with(count, Vec::new);
        let old = std::mem::replace(&mut self.buckets, table);
        for (key, value) in old.into_iter().flatten() {
            let slot = self.bucket_of(&key);
            if let Some(bucket) = self.buckets.get_mut(slot) {
                bucket.push((key, value));
            }
        }
    }
}

#[cfg(test)]
mod tests;
