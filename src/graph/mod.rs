//! Adjacency-list graph substrate and the algorithms built on it.

pub mod core;
pub mod tarjan;

pub use core::Graph;
