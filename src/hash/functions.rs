//! Hash functions and seeds.
//!
//! Aleph-w's `hash-fct.H` ships a small family of byte-string hashers
//! (DEK, FNV-style, ELF, BKDR, ...) so table constructors can pick one
//! independent of the table's key equality. This module realizes the
//! same idea for Rust keys: a [`HashFn`] trait plus a couple of concrete
//! hashers, with [`default_hasher`] choosing a solid general-purpose one.

use std::hash::{Hash, Hasher};

/// A seeded byte/key hash function usable by the hash-table family.
pub trait HashFn<K: ?Sized> {
    fn hash(&self, key: &K) -> u64;
}

/// 64-bit FNV-1a, the default choice: good distribution, no setup cost,
/// and trivially seedable by mixing the seed into the offset basis.
#[derive(Clone, Copy, Debug)]
pub struct Fnv1aHasher {
    seed: u64,
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl Fnv1aHasher {
    pub fn new() -> Self {
        Self { seed: FNV_OFFSET_BASIS }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: FNV_OFFSET_BASIS ^ seed }
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut h = self.seed;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + ?Sized> HashFn<K> for Fnv1aHasher {
    fn hash(&self, key: &K) -> u64 {
        struct ByteCollector(Vec<u8>);
        impl Hasher for ByteCollector {
            fn finish(&self) -> u64 {
                0
            }
            fn write(&mut self, bytes: &[u8]) {
                self.0.extend_from_slice(bytes);
            }
        }
        let mut collector = ByteCollector(Vec::new());
        key.hash(&mut collector);
        self.hash_bytes(&collector.0)
    }
}

/// Jenkins' one-at-a-time hash, ported in spirit from `hash-fct.H`'s
/// `super_fast_hash` family; kept as a distinct algorithm so callers who
/// need a second, independent hash (e.g. for a Bloom filter layered on
/// top of a hash table) can pick it explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct OneAtATimeHasher {
    seed: u64,
}

impl OneAtATimeHasher {
    pub fn new() -> Self {
        Self { seed: 0 }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut h: u64 = self.seed;
        for &b in bytes {
            h = h.wrapping_add(b as u64);
            h = h.wrapping_add(h << 10);
            h ^= h >> 6;
        }
        h = h.wrapping_add(h << 3);
        h ^= h >> 11;
        h = h.wrapping_add(h << 15);
        h
    }
}

impl<K: Hash + ?Sized> HashFn<K> for OneAtATimeHasher {
    fn hash(&self, key: &K) -> u64 {
        struct ByteCollector(Vec<u8>);
        impl Hasher for ByteCollector {
            fn finish(&self) -> u64 {
                0
            }
            fn write(&mut self, bytes: &[u8]) {
                self.0.extend_from_slice(bytes);
            }
        }
        let mut collector = ByteCollector(Vec::new());
        key.hash(&mut collector);
        self.hash_bytes(&collector.0)
    }
}

/// The hasher used by hash tables that don't ask for a specific one.
pub fn default_hasher() -> Fnv1aHasher {
    Fnv1aHasher::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let h = Fnv1aHasher::new();
        assert_eq!(HashFn::<str>::hash(&h, "hello"), HashFn::<str>::hash(&h, "hello"));
        assert_ne!(HashFn::<str>::hash(&h, "hello"), HashFn::<str>::hash(&h, "world"));
    }

    #[test]
    fn seed_changes_value() {
        let a = Fnv1aHasher::new();
        let b = Fnv1aHasher::with_seed(42);
        assert_ne!(HashFn::<str>::hash(&a, "hello"), HashFn::<str>::hash(&b, "hello"));
    }

    #[test]
    fn one_at_a_time_differs_from_fnv() {
        let a = default_hasher();
        let b = OneAtATimeHasher::new();
        assert_ne!(HashFn::<str>::hash(&a, "hello"), HashFn::<str>::hash(&b, "hello"));
    }
}
