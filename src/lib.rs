//! # alephw-ds
//!
//! Generic in-memory data structures: a rank-augmented balanced/randomized
//! binary search tree family with split/join, separate-chaining and linear
//! (extendible) hash tables, a handle-stable pointer-tree binary heap, a
//! dynamic bit array, an adjacency-list graph substrate with Tarjan
//! SCC/cycle detection, and a generic Huffman codec.
//!
//! ## Buffer Example
//!
//! ```rs
//! use alephw_ds::tree::RandomizedTree;
//! let mut t: RandomizedTree<i32, &str> = RandomizedTree::new();
//! t.insert(3, "three").unwrap();
//! t.insert(1, "one").unwrap();
//! assert_eq!(t.select(0).unwrap().0, &1);
//! ```

pub mod bitarray;
pub mod csv_graph;
pub mod dot;
pub mod error;
pub mod graph;
pub mod hash;
pub mod heap;
pub mod huffman;
pub mod tree;

pub use error::{AResult, Error};
