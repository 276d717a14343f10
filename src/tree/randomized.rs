//! Randomized self-balancing tree.
//!
//! Root-level randomness ("treap without explicit priorities"): inserting
//! into a subtree of size `n` makes the new node the subtree root with
//! probability `1/(n+1)`; this is equivalent in distribution to building
//! an ordinary BST from a uniformly random insertion order, so height
//! stays `O(log n)` in expectation regardless of adversarial input order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::core::{self, Arena, SplitOutcome};
use super::{Comparator, NaturalOrder};
use crate::error::{AResult, Error};

/// A randomized balanced binary search tree over `K -> V`, with an
/// order-statistic API (`select`/`position`) and split/join support.
pub struct RandomizedTree<K, V, C: Comparator<K> = NaturalOrder> {
    arena: Arena<K, V>,
    root: Option<usize>,
    cmp: C,
    rng: StdRng,
}

impl<K, V> RandomizedTree<K, V, NaturalOrder>
where
    K: Ord,
{
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Seed the internal RNG for reproducible test runs. The RNG is
    /// per-instance, never global, so two trees seeded the same way
    /// shape identically.
    pub fn with_seed(seed: u64) -> Self {
        let mut t = Self::new();
        t.rng = StdRng::seed_from_u64(seed);
        t
    }
}

impl<K, V> Default for RandomizedTree<K, V, NaturalOrder>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Comparator<K>> RandomizedTree<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self { arena: Arena::new(), root: None, cmp, rng: StdRng::from_entropy() }
    }

    pub fn with_comparator_and_seed(cmp: C, seed: u64) -> Self {
        Self { arena: Arena::new(), root: None, cmp, rng: StdRng::seed_from_u64(seed) }
    }

    pub fn len(&self) -> usize {
        core::count(&self.arena, self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn search(&self, key: &K) -> Option<&V> {
        core::search(&self.arena, self.root, key, &self.cmp).map(|i| &self.arena.get(i).value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Insert `key -> value`; fails with [`Error::DuplicateKey`] if `key`
    /// is already present, leaving the tree unchanged.
    pub fn insert(&mut self, key: K, value: V) -> AResult<()> {
        match insert_randomized(&mut self.arena, self.root, key, value, &self.cmp, &mut self.rng)
        {
            Ok(new_root) => {
                self.root = Some(new_root);
                Ok(())
            }
            Err(()) => Err(Error::DuplicateKey),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (new_root, removed) =
            remove_randomized(&mut self.arena, self.root, key, &self.cmp, &mut self.rng);
        self.root = new_root;
        removed.map(|(_, v)| v)
    }

    /// `i`-th key in sorted order (0-indexed); `Err` if `i >= len()`.
    pub fn select(&self, i: usize) -> AResult<(&K, &V)> {
        let len = self.len();
        core::select(&self.arena, self.root, i)
            .map(|idx| {
                let n = self.arena.get(idx);
                (&n.key, &n.value)
            })
            .ok_or(Error::IndexOutOfBounds { index: i, len })
    }

    /// In-order rank of `key`: `-1` if below the minimum, `len()` if above
    /// the maximum, otherwise its 0-indexed position.
    pub fn position(&self, key: &K) -> i64 {
        core::find_position(&self.arena, self.root, key, &self.cmp).0
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut stack = Vec::new();
        push_left_spine(&self.arena, self.root, &mut stack);
        Iter { arena: &self.arena, stack }
    }
}

impl<K, V, C: Comparator<K> + Clone> RandomizedTree<K, V, C> {
    /// Split into `(L, R)` with `L`'s keys `< key`, `R`'s keys `> key`.
    /// Returns `Err(self)`, unchanged, if `key` is already present.
    pub fn split_by_key(mut self, key: &K) -> Result<(Self, Self), Self> {
        match core::split_by_key(&mut self.arena, self.root, key, &self.cmp, false) {
            SplitOutcome::Unchanged => Err(self),
            SplitOutcome::Split(l, r) => Ok(self.into_halves(l, r)),
        }
    }

    /// As [`split_by_key`](Self::split_by_key), but always splits: a node
    /// equal to `key` ends up at `R`'s minimum.
    pub fn split_key_dup(mut self, key: &K) -> (Self, Self) {
        match core::split_by_key(&mut self.arena, self.root, key, &self.cmp, true) {
            SplitOutcome::Unchanged => unreachable!("dup split always splits"),
            SplitOutcome::Split(l, r) => self.into_halves(l, r),
        }
    }

    /// Split into `(L, R)` with `L` holding the first `i` keys in order.
    pub fn split_by_pos(mut self, i: usize) -> (Self, Self) {
        let (l, r) = core::split_by_pos(&mut self.arena, self.root, i);
        self.into_halves(l, r)
    }

    /// `L` keeps this tree's arena (the detached right half becomes
    /// unreachable garbage in it); `R` gets a fresh arena and the right
    /// subtree's nodes are moved into it node-by-node.
    fn into_halves(mut self, l: Option<usize>, r: Option<usize>) -> (Self, Self) {
        let mut right_arena = Arena::new();
        let new_r = core::extract_subtree(&mut self.arena, &mut right_arena, r);
        let mut right_rng = self.rng.clone();
        right_rng.gen::<u64>();
        let right = Self { arena: right_arena, root: new_r, cmp: self.cmp.clone(), rng: right_rng };
        self.root = l;
        (self, right)
    }

    /// Join two trees with disjoint, ordered key ranges (`max(a) <
    /// min(b)`). Fails with [`Error::NonExclusiveJoin`] if the
    /// precondition does not hold.
    pub fn join_exclusive(a: Self, b: Self) -> AResult<Self> {
        if let (Some(max_a), Some(min_b)) = (a.max_key(), b.min_key()) {
            if !a.cmp.less(max_a, min_b) {
                return Err(Error::NonExclusiveJoin);
            }
        }
        Ok(Self::absorb(a, b, core::join_exclusive))
    }

    /// Full merge that tolerates duplicate keys but makes no attempt to
    /// detect them: a key present in both `a` and `b` survives from
    /// whichever tree happens to be chosen as the pivot at that step.
    pub fn join_dup(a: Self, b: Self) -> Self {
        let mut dups = Vec::new();
        let result = Self::absorb_merging(a, b, &mut dups);
        debug_assert!(dups.is_empty(), "merge_dup never reports duplicates on its own");
        result
    }

    /// Full merge that redirects every key found in both `a` and `b`
    /// into a second, freshly built tree of duplicates.
    pub fn join(a: Self, b: Self) -> (Self, Self) {
        let cmp = a.cmp.clone();
        let mut dups = Vec::new();
        let merged = Self::absorb_merging(a, b, &mut dups);
        let mut dup_tree = Self::with_comparator(cmp);
        for (k, v) in dups {
            let _ = dup_tree.insert(k, v);
        }
        (merged, dup_tree)
    }

    fn max_key(&self) -> Option<&K> {
        core::select(&self.arena, self.root, self.len().checked_sub(1)?).map(|i| &self.arena.get(i).key)
    }

    fn min_key(&self) -> Option<&K> {
        core::select(&self.arena, self.root, 0).map(|i| &self.arena.get(i).key)
    }

    /// Move `b`'s nodes into `a`'s arena, then let `f` link the two
    /// (now sibling) root indices together. Joining two empty trees
    /// stays empty rather than reaching `f`, which assumes at least one
    /// side has a root.
    fn absorb(mut a: Self, mut b: Self, f: impl FnOnce(&mut Arena<K, V>, Option<usize>, Option<usize>) -> usize) -> Self {
        let moved_root = core::extract_subtree(&mut b.arena, &mut a.arena, b.root);
        a.root = match (a.root, moved_root) {
            (None, None) => None,
            _ => Some(f(&mut a.arena, a.root, moved_root)),
        };
        a
    }

    fn absorb_merging(mut a: Self, mut b: Self, dups: &mut Vec<(K, V)>) -> Self {
        let moved_root = core::extract_subtree(&mut b.arena, &mut a.arena, b.root);
        let cmp = a.cmp.clone();
        let root = merge_dup(&mut a.arena, a.root, moved_root, &cmp, &mut a.rng, dups);
        a.root = root;
        a
    }
}

/// Merge two (possibly key-overlapping) subtrees living in one shared
/// arena, picking the pivot node at each step with probability
/// proportional to subtree size and splitting the other side by the
/// pivot's key; any node split out as an exact duplicate is collected
/// into `dups` instead of being relinked.
fn merge_dup<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    a: Option<usize>,
    b: Option<usize>,
    cmp: &C,
    rng: &mut StdRng,
    dups: &mut Vec<(K, V)>,
) -> Option<usize> {
    let (Some(ta), Some(tb)) = (a, b) else {
        return a.or(b);
    };
    let sa = core::count(arena, Some(ta));
    let sb = core::count(arena, Some(tb));
    let (pivot, other) = if rng.gen_range(0..(sa + sb) as u64) < sa as u64 { (ta, tb) } else { (tb, ta) };
    let (pl, pr) = {
        let n = arena.get(pivot);
        (n.left, n.right)
    };
    // Own the pivot's key/value up front so splitting `other` by it never
    // needs a borrow that outlives the mutation below.
    let (pivot_key, pivot_value) = arena.dealloc(pivot);
    let (other_l, other_r) = match core::split_by_key(arena, Some(other), &pivot_key, cmp, true) {
        SplitOutcome::Unchanged => unreachable!("dup split always splits"),
        SplitOutcome::Split(l, r) => {
            // The node equal to `pivot_key`, if any, lands at R's minimum
            // (leftmost node), not necessarily at R's root.
            let (r, dup) = extract_min_if_eq(arena, r, &pivot_key, cmp);
            if let Some(pair) = dup {
                dups.push(pair);
            }
            (l, r)
        }
    };
    let new_l = merge_dup(arena, pl, other_l, cmp, rng, dups);
    let new_r = merge_dup(arena, pr, other_r, cmp, rng, dups);
    let new_pivot = arena.alloc(pivot_key, pivot_value);
    arena.get_mut(new_pivot).left = new_l;
    arena.get_mut(new_pivot).right = new_r;
    core::update_count(arena, new_pivot);
    Some(new_pivot)
}

/// If `root`'s minimum (leftmost) node has a key equal to `key`, detach
/// and return it alongside the remaining tree; otherwise return `root`
/// unchanged.
fn extract_min_if_eq<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
) -> (Option<usize>, Option<(K, V)>) {
    let Some(t) = root else {
        return (None, None);
    };
    let l = arena.get(t).left;
    if l.is_none() {
        if cmp.equal(&arena.get(t).key, key) {
            let r = arena.get(t).right;
            let removed = arena.dealloc(t);
            return (r, Some(removed));
        }
        return (Some(t), None);
    }
    let (new_l, removed) = extract_min_if_eq(arena, l, key, cmp);
    arena.get_mut(t).left = new_l;
    core::update_count(arena, t);
    (Some(t), removed)
}

fn push_left_spine<K, V>(arena: &Arena<K, V>, mut cur: Option<usize>, stack: &mut Vec<usize>) {
    while let Some(i) = cur {
        stack.push(i);
        cur = arena.get(i).left;
    }
}

/// In-order iterator over a randomized tree's key/value pairs.
pub struct Iter<'a, K, V> {
    arena: &'a Arena<K, V>,
    stack: Vec<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.stack.pop()?;
        let n = self.arena.get(i);
        push_left_spine(self.arena, n.right, &mut self.stack);
        Some((&n.key, &n.value))
    }
}

/// Split `root` by `key`, allocate a fresh node for `key`/`value`, and
/// attach the two halves as its children — promoting it to the root of
/// this subtree.
fn insert_at_root<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: K,
    value: V,
    cmp: &C,
) -> Result<usize, ()> {
    match core::split_by_key(arena, root, &key, cmp, false) {
        SplitOutcome::Unchanged => Err(()),
        SplitOutcome::Split(l, r) => {
            let idx = arena.alloc(key, value);
            arena.get_mut(idx).left = l;
            arena.get_mut(idx).right = r;
            core::update_count(arena, idx);
            Ok(idx)
        }
    }
}

fn insert_randomized<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: K,
    value: V,
    cmp: &C,
    rng: &mut StdRng,
) -> Result<usize, ()> {
    let Some(t) = root else {
        return Ok(arena.alloc(key, value));
    };
    let s = core::count(arena, Some(t));
    // With probability 1/(s+1), promote the new node to the root of this subtree.
    if rng.gen_range(0..=s) == 0 {
        return insert_at_root(arena, Some(t), key, value, cmp);
    }
    let (go_left, eq) = {
        let n = arena.get(t);
        if cmp.less(&key, &n.key) {
            (true, false)
        } else if cmp.less(&n.key, &key) {
            (false, false)
        } else {
            (false, true)
        }
    };
    if eq {
        return Err(());
    }
    if go_left {
        let l = arena.get(t).left;
        let new_l = insert_randomized(arena, l, key, value, cmp, rng)?;
        arena.get_mut(t).left = Some(new_l);
    } else {
        let r = arena.get(t).right;
        let new_r = insert_randomized(arena, r, key, value, cmp, rng)?;
        arena.get_mut(t).right = Some(new_r);
    }
    core::update_count(arena, t);
    Ok(t)
}

/// Randomized exclusive join: roots win with probability proportional to
/// their subtree sizes.
pub(crate) fn randomized_join<K, V>(
    arena: &mut Arena<K, V>,
    a: Option<usize>,
    b: Option<usize>,
    rng: &mut StdRng,
) -> Option<usize> {
    match (a, b) {
        (None, None) => None,
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (Some(x), Some(y)) => {
            let m = core::count(arena, Some(x));
            let n = core::count(arena, Some(y));
            let pick_left = rng.gen_range(0..(m + n) as u64) < m as u64;
            if pick_left {
                let xr = arena.get(x).right;
                let merged = randomized_join(arena, xr, Some(y), rng);
                arena.get_mut(x).right = merged;
                core::update_count(arena, x);
                Some(x)
            } else {
                let yl = arena.get(y).left;
                let merged = randomized_join(arena, Some(x), yl, rng);
                arena.get_mut(y).left = merged;
                core::update_count(arena, y);
                Some(y)
            }
        }
    }
}

fn remove_randomized<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
    rng: &mut StdRng,
) -> (Option<usize>, Option<(K, V)>) {
    let Some(t) = root else {
        return (None, None);
    };
    let (go_left, eq) = {
        let n = arena.get(t);
        if cmp.less(key, &n.key) {
            (true, false)
        } else if cmp.less(&n.key, key) {
            (false, false)
        } else {
            (false, true)
        }
    };
    if eq {
        let (l, r) = {
            let n = arena.get(t);
            (n.left, n.right)
        };
        let merged = randomized_join(arena, l, r, rng);
        let removed = arena.dealloc(t);
        return (merged, Some(removed));
    }
    if go_left {
        let l = arena.get(t).left;
        let (new_l, removed) = remove_randomized(arena, l, key, cmp, rng);
        arena.get_mut(t).left = new_l;
        core::update_count(arena, t);
        (Some(t), removed)
    } else {
        let r = arena.get(t).right;
        let (new_r, removed) = remove_randomized(arena, r, key, cmp, rng);
        arena.get_mut(t).right = new_r;
        core::update_count(arena, t);
        (Some(t), removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_search_remove_roundtrip() {
        let mut t: RandomizedTree<i32, &str> = RandomizedTree::with_seed(7);
        t.insert(3, "three").unwrap();
        t.insert(1, "one").unwrap();
        t.insert(4, "four").unwrap();
        t.insert(1, "dup").unwrap_err();
        assert_eq!(t.search(&3), Some(&"three"));
        assert_eq!(t.len(), 3);
        assert_eq!(t.remove(&1), Some("one"));
        assert_eq!(t.len(), 2);
        assert_eq!(t.search(&1), None);
    }

    #[test]
    fn select_matches_sorted_rank() {
        let mut t: RandomizedTree<i32, i32> = RandomizedTree::with_seed(42);
        for k in 1..=1000 {
            t.insert(k, k * k).unwrap();
        }
        // rank 499 (0-indexed) among 1..=1000 is key 500.
        let (k, _) = t.select(499).unwrap();
        assert_eq!(*k, 500);
    }

    #[test]
    fn in_order_iteration_is_sorted() {
        let mut t: RandomizedTree<i32, ()> = RandomizedTree::with_seed(1);
        for k in [9, 1, 5, 3, 7, 2, 8, 4, 6, 0] {
            t.insert(k, ()).unwrap();
        }
        let got: Vec<i32> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn empty_tree_boundary() {
        let t: RandomizedTree<i32, ()> = RandomizedTree::new();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert!(t.select(0).is_err());
    }

    #[test]
    fn singleton_remove_yields_empty() {
        let mut t: RandomizedTree<i32, ()> = RandomizedTree::with_seed(3);
        t.insert(1, ()).unwrap();
        assert_eq!(t.remove(&1), Some(()));
        assert!(t.is_empty());
    }

    fn tree_of(seed: u64, keys: impl IntoIterator<Item = i32>) -> RandomizedTree<i32, i32> {
        let mut t = RandomizedTree::with_seed(seed);
        for k in keys {
            t.insert(k, k * 10).unwrap();
        }
        t
    }

    #[test]
    fn split_by_key_then_join_exclusive_is_identity() {
        // 9 is absent from this tree, so the non-dup split succeeds.
        let t = tree_of(11, (0..9).chain(10..20));
        let Ok((l, r)) = t.split_by_key(&9) else {
            panic!("9 is absent, split_by_key should succeed");
        };
        let l_keys: Vec<i32> = l.iter().map(|(k, _)| *k).collect();
        let r_keys: Vec<i32> = r.iter().map(|(k, _)| *k).collect();
        assert_eq!(l_keys, (0..9).collect::<Vec<_>>());
        assert_eq!(r_keys, (10..20).collect::<Vec<_>>());
        let joined = RandomizedTree::join_exclusive(l, r).expect("ranges are disjoint and ordered");
        let got: Vec<i32> = joined.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, (0..9).chain(10..20).collect::<Vec<_>>());
    }

    #[test]
    fn split_by_key_on_present_key_errs_and_returns_original() {
        let t = tree_of(5, 0..10);
        let Err(t) = t.split_by_key(&5) else {
            panic!("5 is present, split_by_key should fail and hand the tree back");
        };
        assert_eq!(t.len(), 10);
        assert_eq!(t.search(&5), Some(&50));
    }

    #[test]
    fn split_key_dup_places_match_in_right_half() {
        let t = tree_of(8, 0..10);
        let (l, r) = t.split_key_dup(&5);
        assert!(l.iter().all(|(k, _)| *k < 5));
        assert_eq!(r.search(&5), Some(&50));
        assert!(r.iter().all(|(k, _)| *k >= 5));
    }

    #[test]
    fn split_by_pos_divides_in_order() {
        let t = tree_of(2, 0..20);
        let (l, r) = t.split_by_pos(7);
        assert_eq!(l.len(), 7);
        assert_eq!(r.len(), 13);
        let l_keys: Vec<i32> = l.iter().map(|(k, _)| *k).collect();
        assert_eq!(l_keys, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn join_exclusive_rejects_overlapping_ranges() {
        let a = tree_of(1, 0..10);
        let b = tree_of(2, 5..15);
        assert!(RandomizedTree::join_exclusive(a, b).is_err());
    }

    #[test]
    fn join_exclusive_of_two_empty_trees_is_empty() {
        let a: RandomizedTree<i32, i32> = RandomizedTree::new();
        let b: RandomizedTree<i32, i32> = RandomizedTree::new();
        let Ok(joined) = RandomizedTree::join_exclusive(a, b) else {
            panic!("joining two empty trees must succeed");
        };
        assert!(joined.is_empty());
    }

    #[test]
    fn join_dup_merges_disjoint_trees_without_loss() {
        let a = tree_of(3, 0..10);
        let b = tree_of(4, 10..20);
        let merged = RandomizedTree::join_dup(a, b);
        let got: Vec<i32> = merged.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn join_redirects_overlapping_keys_into_a_duplicates_tree() {
        let a = tree_of(6, 0..10);
        let b = tree_of(7, 5..15);
        let (merged, dups) = RandomizedTree::join(a, b);
        // Keys 5..10 are the overlap: each survives once in `merged` and
        // once more in `dups`, so every key is reachable from exactly one
        // of the two trees' own perspective, but the overlap count is 5.
        assert_eq!(dups.len(), 5);
        assert_eq!(merged.len(), 15);
        for k in 0..15 {
            assert_eq!(merged.search(&k), Some(&(k * 10)));
        }
        for k in 5..10 {
            assert_eq!(dups.search(&k), Some(&(k * 10)));
        }
    }
}
