//! AVL tree: height-balanced via an explicit per-node balance factor
//! (`diff = height(R) - height(L) ∈ {-1, 0, +1}`).
//!
//! Unlike the randomized tree, rebalancing here is driven entirely by
//! `diff`, propagated up the insertion/deletion path and corrected with
//! single or double rotations the moment `diff` reaches `±2`. The
//! deficit side at a splice point is always read off the parent/child
//! relationship (never re-derived from a key comparison, which can be
//! stale after a swap-with-successor).

use super::{Comparator, NaturalOrder};
use crate::error::{AResult, Error};

struct Node<K, V> {
    key: K,
    value: V,
    left: Option<usize>,
    right: Option<usize>,
    diff: i8,
}

enum Slot<K, V> {
    Occupied(Node<K, V>),
    Free(Option<usize>),
}

struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<usize>,
}

impl<K, V> Arena<K, V> {
    fn new() -> Self {
        Self { slots: Vec::new(), free_head: None }
    }

    fn alloc(&mut self, key: K, value: V) -> usize {
        let node = Node { key, value, left: None, right: None, diff: 0 };
        match self.free_head {
            Some(i) => {
                self.free_head = match &self.slots[i] {
                    Slot::Free(next) => *next,
                    Slot::Occupied(_) => unreachable!(),
                };
                self.slots[i] = Slot::Occupied(node);
                i
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }

    fn dealloc(&mut self, idx: usize) -> (K, V) {
        let old = std::mem::replace(&mut self.slots[idx], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        match old {
            Slot::Occupied(n) => (n.key, n.value),
            Slot::Free(_) => unreachable!("double free of avl node"),
        }
    }

    fn get(&self, idx: usize) -> &Node<K, V> {
        match &self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling avl node index"),
        }
    }

    fn get_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match &mut self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling avl node index"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn rotate_left<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let r = arena.get(t).right.expect("rotate_left requires a right child");
    let r_left = arena.get(r).left;
    arena.get_mut(t).right = r_left;
    arena.get_mut(r).left = Some(t);
    r
}

fn rotate_right<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let l = arena.get(t).left.expect("rotate_right requires a left child");
    let l_right = arena.get(l).right;
    arena.get_mut(t).left = l_right;
    arena.get_mut(l).right = Some(t);
    l
}

/// `(new_root, grew)`: `grew` says whether this subtree's height
/// increased (propagates the insertion rebalancing decision upward).
fn insert_avl<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: K,
    value: V,
    cmp: &C,
) -> Result<(usize, bool), ()> {
    let Some(t) = root else {
        return Ok((arena.alloc(key, value), true));
    };
    let (side, eq) = {
        let n = arena.get(t);
        if cmp.less(&key, &n.key) {
            (Side::Left, false)
        } else if cmp.less(&n.key, &key) {
            (Side::Right, false)
        } else {
            (Side::Left, true)
        }
    };
    if eq {
        return Err(());
    }
    let grew = match side {
        Side::Left => {
            let l = arena.get(t).left;
            let (new_l, child_grew) = insert_avl(arena, l, key, value, cmp)?;
            arena.get_mut(t).left = Some(new_l);
            if child_grew {
                arena.get_mut(t).diff -= 1;
            }
            child_grew
        }
        Side::Right => {
            let r = arena.get(t).right;
            let (new_r, child_grew) = insert_avl(arena, r, key, value, cmp)?;
            arena.get_mut(t).right = Some(new_r);
            if child_grew {
                arena.get_mut(t).diff += 1;
            }
            child_grew
        }
    };
    if !grew {
        return Ok((t, false));
    }
    match arena.get(t).diff {
        0 => Ok((t, false)),
        -1 | 1 => Ok((t, true)),
        -2 => Ok((rebalance_left_heavy_after_insert(arena, t), false)),
        2 => Ok((rebalance_right_heavy_after_insert(arena, t), false)),
        d => unreachable!("impossible balance factor {d} after single insertion step"),
    }
}

fn rebalance_left_heavy_after_insert<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let l = arena.get(t).left.expect("left-heavy node must have a left child");
    if arena.get(l).diff <= 0 {
        // LL case: single right rotation.
        log::trace!("avl LL rotation");
        let new_root = rotate_right(arena, t);
        arena.get_mut(t).diff = 0;
        arena.get_mut(new_root).diff = 0;
        new_root
    } else {
        // LR case: double rotation (left on l, then right on t).
        log::trace!("avl LR rotation");
        let lr = arena.get(l).right.expect("LR case requires l.right");
        let lr_diff = arena.get(lr).diff;
        let new_l = rotate_left(arena, l);
        arena.get_mut(t).left = Some(new_l);
        let new_root = rotate_right(arena, t);
        match lr_diff {
            -1 => {
                arena.get_mut(t).diff = 1;
                arena.get_mut(l).diff = 0;
            }
            1 => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(l).diff = -1;
            }
            _ => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(l).diff = 0;
            }
        }
        arena.get_mut(new_root).diff = 0;
        new_root
    }
}

fn rebalance_right_heavy_after_insert<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let r = arena.get(t).right.expect("right-heavy node must have a right child");
    if arena.get(r).diff >= 0 {
        // RR case: single left rotation.
        log::trace!("avl RR rotation");
        let new_root = rotate_left(arena, t);
        arena.get_mut(t).diff = 0;
        arena.get_mut(new_root).diff = 0;
        new_root
    } else {
        // RL case: double rotation (right on r, then left on t).
        log::trace!("avl RL rotation");
        let rl = arena.get(r).left.expect("RL case requires r.left");
        let rl_diff = arena.get(rl).diff;
        let new_r = rotate_right(arena, r);
        arena.get_mut(t).right = Some(new_r);
        let new_root = rotate_left(arena, t);
        match rl_diff {
            1 => {
                arena.get_mut(t).diff = -1;
                arena.get_mut(r).diff = 0;
            }
            -1 => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(r).diff = 1;
            }
            _ => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(r).diff = 0;
            }
        }
        arena.get_mut(new_root).diff = 0;
        new_root
    }
}

/// `(new_root, shrunk)`: `shrunk` says whether this subtree's height
/// decreased (deletion rebalancing must keep propagating even after a
/// rotation, unlike insertion).
fn remove_avl<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
) -> (Option<usize>, Option<(K, V)>, bool) {
    let Some(t) = root else {
        return (None, None, false);
    };
    let (side, eq) = {
        let n = arena.get(t);
        if cmp.less(key, &n.key) {
            (Side::Left, false)
        } else if cmp.less(&n.key, key) {
            (Side::Right, false)
        } else {
            (Side::Left, true)
        }
    };
    if eq {
        let (l, r) = {
            let n = arena.get(t);
            (n.left, n.right)
        };
        return match (l, r) {
            (None, None) => {
                let removed = arena.dealloc(t);
                (None, Some(removed), true)
            }
            (Some(only), None) | (None, Some(only)) => {
                let removed = arena.dealloc(t);
                (Some(only), Some(removed), true)
            }
            (Some(_), Some(_)) => {
                // Swap with the in-order successor (minimum of the right
                // subtree), then delete the successor from the right
                // subtree. The deficit side at this splice point is the
                // right side, by construction, never re-derived from a
                // key comparison.
                let (new_r, succ, shrunk) = remove_min(arena, r);
                let (succ_key, succ_value) = succ.expect("right subtree is non-empty");
                let old_key = std::mem::replace(&mut arena.get_mut(t).key, succ_key);
                let old_value = std::mem::replace(&mut arena.get_mut(t).value, succ_value);
                arena.get_mut(t).right = new_r;
                if shrunk {
                    arena.get_mut(t).diff -= 1;
                }
                let (new_root, final_shrunk) = rebalance_after_right_shrink(arena, t, shrunk);
                (Some(new_root), Some((old_key, old_value)), final_shrunk)
            }
        };
    }
    match side {
        Side::Left => {
            let l = arena.get(t).left;
            let (new_l, removed, shrunk) = remove_avl(arena, l, key, cmp);
            arena.get_mut(t).left = new_l;
            if shrunk {
                arena.get_mut(t).diff += 1;
            }
            let (new_root, final_shrunk) = rebalance_after_left_shrink(arena, t, shrunk);
            (Some(new_root), removed, final_shrunk)
        }
        Side::Right => {
            let r = arena.get(t).right;
            let (new_r, removed, shrunk) = remove_avl(arena, r, key, cmp);
            arena.get_mut(t).right = new_r;
            if shrunk {
                arena.get_mut(t).diff -= 1;
            }
            let (new_root, final_shrunk) = rebalance_after_right_shrink(arena, t, shrunk);
            (Some(new_root), removed, final_shrunk)
        }
    }
}

/// Remove the minimum-key node from `root`, returning the new subtree
/// root, the removed (key, value), and whether the subtree height
/// decreased.
fn remove_min<K, V>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
) -> (Option<usize>, Option<(K, V)>, bool) {
    let Some(t) = root else {
        return (None, None, false);
    };
    match arena.get(t).left {
        None => {
            let r = arena.get(t).right;
            let removed = arena.dealloc(t);
            (r, Some(removed), true)
        }
        Some(l) => {
            let (new_l, removed, shrunk) = remove_min(arena, Some(l));
            arena.get_mut(t).left = new_l;
            if shrunk {
                arena.get_mut(t).diff += 1;
            }
            let (new_root, final_shrunk) = rebalance_after_left_shrink(arena, t, shrunk);
            (Some(new_root), removed, final_shrunk)
        }
    }
}

/// After the left subtree's height decreased, `t.diff` has already been
/// incremented by the caller; correct `diff == 2` with rotations and
/// report whether `t`'s own height decreased.
fn rebalance_after_left_shrink<K, V>(arena: &mut Arena<K, V>, t: usize, child_shrunk: bool) -> (usize, bool) {
    if !child_shrunk {
        return (t, false);
    }
    match arena.get(t).diff {
        -1 => (t, false),
        0 => (t, true),
        2 => rebalance_right_heavy_after_delete(arena, t),
        d => unreachable!("impossible balance factor {d} after left shrink"),
    }
}

/// Mirror of [`rebalance_after_left_shrink`] for a right-subtree shrink.
fn rebalance_after_right_shrink<K, V>(arena: &mut Arena<K, V>, t: usize, child_shrunk: bool) -> (usize, bool) {
    if !child_shrunk {
        return (t, false);
    }
    match arena.get(t).diff {
        1 => (t, false),
        0 => (t, true),
        -2 => rebalance_left_heavy_after_delete(arena, t),
        d => unreachable!("impossible balance factor {d} after right shrink"),
    }
}

fn rebalance_right_heavy_after_delete<K, V>(arena: &mut Arena<K, V>, t: usize) -> (usize, bool) {
    let r = arena.get(t).right.expect("right-heavy node must have a right child");
    let r_diff = arena.get(r).diff;
    if r_diff >= 0 {
        log::trace!("avl rebalance after delete: single left rotation");
        let new_root = rotate_left(arena, t);
        if r_diff == 0 {
            arena.get_mut(t).diff = 1;
            arena.get_mut(new_root).diff = -1;
            (new_root, false)
        } else {
            arena.get_mut(t).diff = 0;
            arena.get_mut(new_root).diff = 0;
            (new_root, true)
        }
    } else {
        log::trace!("avl rebalance after delete: double right-then-left rotation");
        let rl = arena.get(r).left.expect("RL case requires r.left");
        let rl_diff = arena.get(rl).diff;
        let new_r = rotate_right(arena, r);
        arena.get_mut(t).right = Some(new_r);
        let new_root = rotate_left(arena, t);
        match rl_diff {
            1 => {
                arena.get_mut(t).diff = -1;
                arena.get_mut(r).diff = 0;
            }
            -1 => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(r).diff = 1;
            }
            _ => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(r).diff = 0;
            }
        }
        arena.get_mut(new_root).diff = 0;
        (new_root, true)
    }
}

fn rebalance_left_heavy_after_delete<K, V>(arena: &mut Arena<K, V>, t: usize) -> (usize, bool) {
    let l = arena.get(t).left.expect("left-heavy node must have a left child");
    let l_diff = arena.get(l).diff;
    if l_diff <= 0 {
        log::trace!("avl rebalance after delete: single right rotation");
        let new_root = rotate_right(arena, t);
        if l_diff == 0 {
            arena.get_mut(t).diff = -1;
            arena.get_mut(new_root).diff = 1;
            (new_root, false)
        } else {
            arena.get_mut(t).diff = 0;
            arena.get_mut(new_root).diff = 0;
            (new_root, true)
        }
    } else {
        log::trace!("avl rebalance after delete: double left-then-right rotation");
        let lr = arena.get(l).right.expect("LR case requires l.right");
        let lr_diff = arena.get(lr).diff;
        let new_l = rotate_left(arena, l);
        arena.get_mut(t).left = Some(new_l);
        let new_root = rotate_right(arena, t);
        match lr_diff {
            -1 => {
                arena.get_mut(t).diff = 1;
                arena.get_mut(l).diff = 0;
            }
            1 => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(l).diff = -1;
            }
            _ => {
                arena.get_mut(t).diff = 0;
                arena.get_mut(l).diff = 0;
            }
        }
        arena.get_mut(new_root).diff = 0;
        (new_root, true)
    }
}

fn search_avl<K, V, C: Comparator<K>>(
    arena: &Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
) -> Option<usize> {
    let mut cur = root;
    while let Some(i) = cur {
        let n = arena.get(i);
        if cmp.less(key, &n.key) {
            cur = n.left;
        } else if cmp.less(&n.key, key) {
            cur = n.right;
        } else {
            return Some(i);
        }
    }
    None
}

fn height<K, V>(arena: &Arena<K, V>, root: Option<usize>) -> usize {
    match root {
        None => 0,
        Some(i) => {
            let n = arena.get(i);
            1 + height(arena, n.left).max(height(arena, n.right))
        }
    }
}

/// A height-balanced binary search tree over `K -> V`.
pub struct AvlTree<K, V, C: Comparator<K> = NaturalOrder> {
    arena: Arena<K, V>,
    root: Option<usize>,
    cmp: C,
    len: usize,
}

impl<K: Ord, V> AvlTree<K, V, NaturalOrder> {
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for AvlTree<K, V, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Comparator<K>> AvlTree<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self { arena: Arena::new(), root: None, cmp, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> usize {
        height(&self.arena, self.root)
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        search_avl(&self.arena, self.root, key, &self.cmp).map(|i| &self.arena.get(i).value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    pub fn insert(&mut self, key: K, value: V) -> AResult<()> {
        match insert_avl(&mut self.arena, self.root, key, value, &self.cmp) {
            Ok((new_root, _)) => {
                self.root = Some(new_root);
                self.len += 1;
                Ok(())
            }
            Err(()) => Err(Error::DuplicateKey),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (new_root, removed, _) = remove_avl(&mut self.arena, self.root, key, &self.cmp);
        self.root = new_root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed.map(|(_, v)| v)
    }

    /// Root, left child, right child, and balance factors — exposed for
    /// tests asserting the exact shape of a rebalance.
    #[cfg(test)]
    fn shape(&self) -> Option<(K, i8, Option<K>, Option<K>)>
    where
        K: Clone,
    {
        self.root.map(|r| {
            let n = self.arena.get(r);
            let left = n.left.map(|i| self.arena.get(i).key.clone());
            let right = n.right.map(|i| self.arena.get(i).key.clone());
            (n.key.clone(), n.diff, left, right)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_10_20_30_rotates_left() {
        let mut t: AvlTree<i32, ()> = AvlTree::new();
        t.insert(10, ()).unwrap();
        t.insert(20, ()).unwrap();
        t.insert(30, ()).unwrap();
        let (root, diff, left, right) = t.shape().unwrap();
        assert_eq!(root, 20);
        assert_eq!(diff, 0);
        assert_eq!(left, Some(10));
        assert_eq!(right, Some(30));
    }

    #[test]
    fn every_node_diff_stays_in_range() {
        fn check<K, V>(arena: &Arena<K, V>, root: Option<usize>) -> usize {
            match root {
                None => 0,
                Some(i) => {
                    let n = arena.get(i);
                    assert!((-1..=1).contains(&n.diff), "diff out of range");
                    let lh = check(arena, n.left);
                    let rh = check(arena, n.right);
                    assert_eq!(n.diff as i64, rh as i64 - lh as i64);
                    1 + lh.max(rh)
                }
            }
        }
        let mut t: AvlTree<i32, ()> = AvlTree::new();
        for k in [50, 30, 70, 20, 40, 60, 80, 10, 90, 5, 35, 45, 65, 75, 95] {
            t.insert(k, ()).unwrap();
            check(&t.arena, t.root);
        }
        for k in [50, 10, 90, 30, 70] {
            t.remove(&k);
            check(&t.arena, t.root);
        }
    }

    #[test]
    fn height_is_logarithmic() {
        let mut t: AvlTree<i32, ()> = AvlTree::new();
        for k in 0..1000 {
            t.insert(k, ()).unwrap();
        }
        let n = t.len() as f64;
        assert!((t.height() as f64) <= 1.44 * (n + 2.0).log2());
    }

    #[test]
    fn insert_duplicate_fails_and_remove_singleton_empties() {
        let mut t: AvlTree<i32, &str> = AvlTree::new();
        t.insert(1, "one").unwrap();
        assert!(t.insert(1, "again").is_err());
        assert_eq!(t.remove(&1), Some("one"));
        assert!(t.is_empty());
        assert_eq!(t.remove(&1), None);
    }

    #[test]
    fn search_after_many_insertions_and_removals() {
        let mut t: AvlTree<i32, i32> = AvlTree::new();
        for k in 0..200 {
            t.insert(k, k * 2).unwrap();
        }
        for k in (0..200).step_by(3) {
            t.remove(&k);
        }
        for k in 0..200 {
            if k % 3 == 0 {
                assert_eq!(t.search(&k), None);
            } else {
                assert_eq!(t.search(&k), Some(&(k * 2)));
            }
        }
    }
}
