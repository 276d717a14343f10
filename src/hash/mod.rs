//! Hash-table family: two table strategies sharing the same external
//! operations (`insert`, `search`, `remove`, `search_or_insert`) and the
//! same key/value storage shape, differing in how they grow.

pub mod chaining;
pub mod functions;
pub mod linear;
pub mod primes;

pub use chaining::ChainingTable;
pub use functions::{default_hasher, Fnv1aHasher, HashFn, OneAtATimeHasher};
pub use linear::LinearTable;

/// Shared load-factor policy: grow on `alpha_hi`, shrink on `alpha_lo`.
#[derive(Clone, Copy, Debug)]
pub struct LoadFactor {
    pub lo: f64,
    pub hi: f64,
    pub auto_resize: bool,
}

impl LoadFactor {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi, auto_resize: true }
    }

    pub fn disabled(mut self) -> Self {
        self.auto_resize = false;
        self
    }
}
