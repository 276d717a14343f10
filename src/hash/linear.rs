//! Linear (extendible) hash table.
//!
//! Classic Litwin linear hashing: the bucket array grows by exactly one
//! bucket per threshold crossing (`split_once`) instead of doubling all
//! at once, and a `(level, split_ptr)` pair tracks how far through the
//! current doubling round the table is. A key's bucket is `hash(key) mod
//! (base << level)`, bumped to the next level's modulus if that index
//! has already been split this round (`< split_ptr`).
//!
//! Entries live in a free-listed arena addressed by `usize` slot index;
//! each bucket is a `Vec` of slot indices (the collision chain), and a
//! separate `order` vector of slot indices realizes the insertion-order
//! iteration the source gets from a second intrusive link per bucket.

use super::{default_hasher, Fnv1aHasher, HashFn, LoadFactor};
use crate::error::{AResult, Error};

const DEFAULT_ALPHA_LO: f64 = 0.2;
const DEFAULT_ALPHA_HI: f64 = 0.75;
const DEFAULT_BASE: usize = 8;

enum Slot<K, V> {
    Occupied(K, V),
    Free(Option<usize>),
}

pub struct LinearTable<K, V, H: HashFn<K> = Fnv1aHasher> {
    entries: Vec<Slot<K, V>>,
    free_head: Option<usize>,
    buckets: Vec<Vec<usize>>,
    order: Vec<usize>,
    base: usize,
    level: u32,
    split_ptr: usize,
    len: usize,
    hasher: H,
    load: LoadFactor,
}

impl<K: Eq + std::hash::Hash, V> LinearTable<K, V, Fnv1aHasher> {
    pub fn new() -> Self {
        Self::with_hasher(default_hasher())
    }
}

impl<K: Eq + std::hash::Hash, V> Default for LinearTable<K, V, Fnv1aHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, H: HashFn<K>> LinearTable<K, V, H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self::with_hasher_and_base(hasher, DEFAULT_BASE)
    }

    pub fn with_hasher_and_base(hasher: H, base: usize) -> Self {
        let base = base.max(1);
        Self {
            entries: Vec::new(),
            free_head: None,
            buckets: (0..base).map(|_| Vec::new()).collect(),
            order: Vec::new(),
            base,
            level: 0,
            split_ptr: 0,
            len: 0,
            hasher,
            load: LoadFactor::new(DEFAULT_ALPHA_LO, DEFAULT_ALPHA_HI),
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

    fn span(&self) -> usize {
        self.base << self.level
    }

    fn bucket_for_hash(&self, h: u64) -> usize {
        let span = self.span();
        let idx = (h % span as u64) as usize;
        if idx < self.split_ptr {
            let next_span = span * 2;
            (h % next_span as u64) as usize
        } else {
            idx
        }
    }

    fn bucket_for(&self, key: &K) -> usize {
        self.bucket_for_hash(self.hasher.hash(key))
    }

    fn alloc_entry(&mut self, key: K, value: V) -> usize {
        match self.free_head {
            Some(i) => {
                self.free_head = match &self.entries[i] {
                    Slot::Free(next) => *next,
                    Slot::Occupied(..) => unreachable!(),
                };
                self.entries[i] = Slot::Occupied(key, value);
                i
            }
            None => {
                self.entries.push(Slot::Occupied(key, value));
                self.entries.len() - 1
            }
        }
    }

    fn dealloc_entry(&mut self, idx: usize) -> (K, V) {
        let old = std::mem::replace(&mut self.entries[idx], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        match old {
            Slot::Occupied(k, v) => (k, v),
            Slot::Free(_) => unreachable!("double free of linear-hash entry"),
        }
    }

    fn key_at(&self, idx: usize) -> &K {
        match &self.entries[idx] {
            Slot::Occupied(k, _) => k,
            Slot::Free(_) => panic!("dangling linear-hash slot"),
        }
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        let b = self.bucket_for(key);
        self.buckets[b].iter().find_map(|&idx| match &self.entries[idx] {
            Slot::Occupied(k, v) if k == key => Some(v),
            _ => None,
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    pub fn insert(&mut self, key: K, value: V) -> AResult<()> {
        let b = self.bucket_for(&key);
        if self.buckets[b].iter().any(|&idx| self.key_at(idx) == &key) {
            return Err(Error::DuplicateKey);
        }
        let idx = self.alloc_entry(key, value);
        self.buckets[b].push(idx);
        self.order.push(idx);
        self.len += 1;
        self.maybe_grow();
        Ok(())
    }

    pub fn search_or_insert(&mut self, key: K, value: V) -> bool {
        let b = self.bucket_for(&key);
        if self.buckets[b].iter().any(|&idx| self.key_at(idx) == &key) {
            return false;
        }
        let idx = self.alloc_entry(key, value);
        self.buckets[b].push(idx);
        self.order.push(idx);
        self.len += 1;
        self.maybe_grow();
        true
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let b = self.bucket_for(key);
        let pos = self.buckets[b].iter().position(|&idx| self.key_at(idx) == key)?;
        let slot_idx = self.buckets[b].swap_remove(pos);
        let (_, v) = self.dealloc_entry(slot_idx);
        self.len -= 1;
        self.maybe_shrink();
        Some(v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order.iter().filter_map(move |&idx| match &self.entries[idx] {
            Slot::Occupied(k, v) => Some((k, v)),
            Slot::Free(_) => None,
        })
    }

    /// Split the bucket the `(level, split_ptr)` cursor currently points
    /// at into itself and a freshly appended bucket, advancing the
    /// cursor one step (wrapping into the next level when it reaches
    /// the end of this one).
    fn split_once(&mut self) {
        log::trace!("splitting bucket {} (level {}, span {})", self.split_ptr, self.level, self.span());
        let span = self.span();
        let p = self.split_ptr;
        let next_span = span * 2;
        let new_bucket_idx = self.buckets.len();
        self.buckets.push(Vec::new());
        let moving = std::mem::take(&mut self.buckets[p]);
        for idx in moving {
            let h = self.hasher.hash(self.key_at(idx));
            let target = (h % next_span as u64) as usize;
            if target == p {
                self.buckets[p].push(idx);
            } else {
                self.buckets[new_bucket_idx].push(idx);
            }
        }
        self.split_ptr += 1;
        if self.split_ptr == span {
            self.split_ptr = 0;
            self.level += 1;
        }
    }

    /// Inverse of [`split_once`]: merge the last bucket back into the
    /// bucket it was split out of.
    fn merge_once(&mut self) {
        if self.buckets.len() <= self.base {
            return;
        }
        log::trace!("merging bucket {} back down (level {})", self.buckets.len() - 1, self.level);
        if self.split_ptr == 0 {
            self.level -= 1;
            let span = self.span();
            self.split_ptr = span - 1;
        } else {
            self.split_ptr -= 1;
        }
        let target = self.split_ptr;
        let moved = self.buckets.pop().expect("capacity above base has a last bucket");
        self.buckets[target].extend(moved);
    }

    fn maybe_grow(&mut self) {
        if !self.load.auto_resize {
            return;
        }
        while self.len as f64 / self.buckets.len() as f64 >= self.load.hi {
            self.split_once();
        }
    }

    fn maybe_shrink(&mut self) {
        if !self.load.auto_resize {
            return;
        }
        while self.buckets.len() > self.base
            && self.len as f64 / self.buckets.len() as f64 <= self.load.lo
        {
            self.merge_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_search_remove_roundtrip() {
        let mut t: LinearTable<i32, &str> = LinearTable::new();
        t.insert(1, "one").unwrap();
        t.insert(2, "two").unwrap();
        assert_eq!(t.search(&1), Some(&"one"));
        assert!(t.insert(1, "dup").is_err());
        assert_eq!(t.remove(&1), Some("one"));
        assert_eq!(t.search(&1), None);
    }

    #[test]
    fn incremental_split_keeps_all_keys_reachable() {
        let mut t: LinearTable<i32, i32> = LinearTable::with_hasher_and_base(default_hasher(), 4);
        for k in 0..2000 {
            t.insert(k, k * 3).unwrap();
        }
        assert!(t.capacity() > 4);
        for k in 0..2000 {
            assert_eq!(t.search(&k), Some(&(k * 3)));
        }
    }

    #[test]
    fn insertion_order_iteration_unaffected_by_splits() {
        let mut t: LinearTable<i32, ()> = LinearTable::with_hasher_and_base(default_hasher(), 2);
        let keys: Vec<i32> = (0..500).collect();
        for &k in &keys {
            t.insert(k, ()).unwrap();
        }
        let got: Vec<i32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, keys);
    }

    #[test]
    fn merges_back_down_after_bulk_removal() {
        let mut t: LinearTable<i32, ()> = LinearTable::with_hasher_and_base(default_hasher(), 4);
        for k in 0..300 {
            t.insert(k, ()).unwrap();
        }
        let grown_capacity = t.capacity();
        for k in 0..295 {
            t.remove(&k);
        }
        assert!(t.capacity() < grown_capacity);
        assert!(t.capacity() >= 4);
        for k in 295..300 {
            assert_eq!(t.search(&k), Some(&()));
        }
    }

    #[test]
    fn search_or_insert_reports_whether_new() {
        let mut t: LinearTable<i32, &str> = LinearTable::new();
        assert!(t.search_or_insert(7, "a"));
        assert!(!t.search_or_insert(7, "b"));
        assert_eq!(t.search(&7), Some(&"a"));
    }
}
