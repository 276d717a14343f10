//! Balanced/randomized binary search tree family.
//!
//! [`core`] is the shared rank-augmented BST kernel (rotations, rank
//! bookkeeping, insert-at-root, split/join). [`randomized`] and [`avl`]
//! are the two self-balancing strategies built on top of it.

pub mod avl;
pub mod core;
pub mod randomized;

pub use avl::AvlTree;
pub use randomized::RandomizedTree;

/// A strict weak ordering, customizable per container instance instead of
/// being fixed to `Ord` — a `less(a, b)` comparator parameter.
pub trait Comparator<K: ?Sized> {
    fn less(&self, a: &K, b: &K) -> bool;

    fn equal(&self, a: &K, b: &K) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

/// The default comparator: delegate to the key's own `Ord` impl.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}
