//! Separate-chaining hash table.
//!
//! Each bucket index owns a `Vec` collision chain; growth and shrink
//! rehash the whole table to a new prime-sized array of chains, chosen
//! so the load factor (`len / buckets.len()`) lands back inside
//! `(alpha_lo, alpha_hi)`.

use super::primes;
use super::{default_hasher, Fnv1aHasher, HashFn, LoadFactor};
use crate::error::{AResult, Error};

const DEFAULT_ALPHA_LO: f64 = 0.2;
const DEFAULT_ALPHA_HI: f64 = 2.0;
const DEFAULT_INITIAL_CAPACITY: usize = 11;

pub struct ChainingTable<K, V, H: HashFn<K> = Fnv1aHasher> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    hasher: H,
    load: LoadFactor,
    initial_capacity: usize,
}

impl<K: Eq + std::hash::Hash, V> ChainingTable<K, V, Fnv1aHasher> {
    pub fn new() -> Self {
        Self::with_hasher(default_hasher())
    }
}

impl<K: Eq + std::hash::Hash, V> Default for ChainingTable<K, V, Fnv1aHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, H: HashFn<K>> ChainingTable<K, V, H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_capacity(hasher, DEFAULT_INITIAL_CAPACITY)
    }

    pub fn with_hasher_and_capacity(hasher: H, capacity: usize) -> Self {
        let capacity = primes::next_prime(capacity.max(2));
        Self {
            buckets: (0..capacity).map(|_| Vec::new()).collect(),
            len: 0,
            hasher,
            load: LoadFactor::new(DEFAULT_ALPHA_LO, DEFAULT_ALPHA_HI),
            initial_capacity: capacity,
        }
    }

    pub fn with_load_factor(mut self, lo: f64, hi: f64) -> Self {
        self.load = LoadFactor::new(lo, hi);
        self
    }

    pub fn without_auto_resize(mut self) -> Self {
        self.load = self.load.disabled();
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(&self, key: &K) -> usize {
        (self.hasher.hash(key) % self.buckets.len() as u64) as usize
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    pub fn insert(&mut self, key: K, value: V) -> AResult<()> {
        let idx = self.bucket_index(&key);
        if self.buckets[idx].iter().any(|(k, _)| k == &key) {
            return Err(Error::DuplicateKey);
        }
        self.buckets[idx].push((key, value));
        self.len += 1;
        self.maybe_grow();
        Ok(())
    }

    /// Insert `key -> value` if absent; returns `true` if it was newly
    /// inserted, `false` if `key` was already present (the existing
    /// value is left untouched).
    pub fn search_or_insert(&mut self, key: K, value: V) -> bool {
        let idx = self.bucket_index(&key);
        if self.buckets[idx].iter().any(|(k, _)| k == &key) {
            return false;
        }
        self.buckets[idx].push((key, value));
        self.len += 1;
        self.maybe_grow();
        true
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.bucket_index(key);
        let pos = self.buckets[idx].iter().position(|(k, _)| k == key)?;
        let (_, v) = self.buckets[idx].swap_remove(pos);
        self.len -= 1;
        self.maybe_shrink();
        Some(v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets.iter().flatten().map(|(k, v)| (k, v))
    }

    fn resize(&mut self, new_size: usize) {
        log::debug!("rehashing chaining table from {} to {} buckets ({} entries)", self.buckets.len(), new_size, self.len);
        let mut new_buckets: Vec<Vec<(K, V)>> = (0..new_size).map(|_| Vec::new()).collect();
        for (k, v) in self.buckets.drain(..).flatten() {
            let idx = (self.hasher.hash(&k) % new_size as u64) as usize;
            new_buckets[idx].push((k, v));
        }
        self.buckets = new_buckets;
    }

    fn maybe_grow(&mut self) {
        if !self.load.auto_resize {
            return;
        }
        let alpha = self.len as f64 / self.buckets.len() as f64;
        if alpha >= self.load.hi {
            log::trace!("load factor {alpha:.2} reached the grow threshold {}", self.load.hi);
            let new_size = primes::next_prime(self.buckets.len() * 2);
            self.resize(new_size);
        }
    }

    fn maybe_shrink(&mut self) {
        if !self.load.auto_resize {
            return;
        }
        let alpha = self.len as f64 / self.buckets.len() as f64;
        if alpha <= self.load.lo {
            let new_size = primes::next_prime(self.buckets.len() / 2).max(self.initial_capacity);
            if new_size < self.buckets.len() {
                log::trace!("load factor {alpha:.2} reached the shrink threshold {}", self.load.lo);
                self.resize(new_size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_search_remove_roundtrip() {
        let mut t: ChainingTable<String, i32> = ChainingTable::new();
        t.insert("one".to_string(), 1).unwrap();
        t.insert("two".to_string(), 2).unwrap();
        assert_eq!(t.search(&"one".to_string()), Some(&1));
        assert!(t.insert("one".to_string(), 99).is_err());
        assert_eq!(t.remove(&"one".to_string()), Some(1));
        assert_eq!(t.search(&"one".to_string()), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn search_or_insert_reports_whether_new() {
        let mut t: ChainingTable<i32, &str> = ChainingTable::new();
        assert!(t.search_or_insert(1, "a"));
        assert!(!t.search_or_insert(1, "b"));
        assert_eq!(t.search(&1), Some(&"a"));
    }

    #[test]
    fn grows_under_heavy_load_and_keeps_all_keys() {
        let mut t: ChainingTable<i32, i32> = ChainingTable::with_hasher_and_capacity(default_hasher(), 3);
        for k in 0..500 {
            t.insert(k, k * 10).unwrap();
        }
        assert!(t.capacity() > 3);
        for k in 0..500 {
            assert_eq!(t.search(&k), Some(&(k * 10)));
        }
    }

    #[test]
    fn shrinks_after_bulk_removal_but_not_below_initial_capacity() {
        let mut t: ChainingTable<i32, ()> =
            ChainingTable::with_hasher_and_capacity(default_hasher(), 11);
        for k in 0..200 {
            t.insert(k, ()).unwrap();
        }
        for k in 0..195 {
            t.remove(&k);
        }
        assert!(t.capacity() >= 11);
    }

    #[test]
    fn auto_resize_can_be_disabled() {
        let mut t: ChainingTable<i32, ()> =
            ChainingTable::with_hasher_and_capacity(default_hasher(), 3).without_auto_resize();
        for k in 0..50 {
            t.insert(k, ()).unwrap();
        }
        assert_eq!(t.capacity(), 3);
    }
}
