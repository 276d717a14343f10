//! Rank-augmented BST kernel.
//!
//! Nodes live in an arena (`Vec<Slot<K, V>>`) and are addressed by index
//! rather than pointer, so the kernel never needs `unsafe` to give every
//! container intrusive, move-free restructuring. A node's `count` field
//! is always `count(L) + 1 + count(R)`; every mutator here restores that
//! invariant on the path it touches before returning.

use super::Comparator;

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub count: usize,
}

enum Slot<K, V> {
    Occupied(Node<K, V>),
    Free(Option<usize>),
}

/// Arena owning every node of one tree instance.
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<usize>,
}

impl<K, V> Arena<K, V> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), free_head: None }
    }

    pub fn alloc(&mut self, key: K, value: V) -> usize {
        let node = Node { key, value, left: None, right: None, count: 1 };
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

    /// Remove the node at `idx` from the arena and return its payload.
    /// Does not touch `left`/`right` links of other nodes.
    pub fn dealloc(&mut self, idx: usize) -> (K, V) {
        let old = std::mem::replace(&mut self.slots[idx], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        match old {
            Slot::Occupied(n) => (n.key, n.value),
            Slot::Free(_) => unreachable!("double free of tree node"),
        }
    }

    pub fn get(&self, idx: usize) -> &Node<K, V> {
        match &self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling tree node index"),
        }
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match &mut self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling tree node index"),
        }
    }
}

pub(crate) fn count<K, V>(arena: &Arena<K, V>, node: Option<usize>) -> usize {
    node.map_or(0, |i| arena.get(i).count)
}

pub(crate) fn update_count<K, V>(arena: &mut Arena<K, V>, idx: usize) {
    let (l, r) = {
        let n = arena.get(idx);
        (n.left, n.right)
    };
    let c = count(arena, l) + 1 + count(arena, r);
    arena.get_mut(idx).count = c;
}

/// Rotate `t` left: `t`'s right child becomes the new subtree root.
pub(crate) fn rotate_left<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let r = arena.get(t).right.expect("rotate_left requires a right child");
    let r_left = arena.get(r).left;
    arena.get_mut(t).right = r_left;
    arena.get_mut(r).left = Some(t);
    update_count(arena, t);
    update_count(arena, r);
    r
}

/// Rotate `t` right: `t`'s left child becomes the new subtree root.
pub(crate) fn rotate_right<K, V>(arena: &mut Arena<K, V>, t: usize) -> usize {
    let l = arena.get(t).left.expect("rotate_right requires a left child");
    let l_right = arena.get(l).right;
    arena.get_mut(t).left = l_right;
    arena.get_mut(l).right = Some(t);
    update_count(arena, t);
    update_count(arena, l);
    l
}

pub(crate) fn search<K, V, C: Comparator<K>>(
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

/// Insert `idx` (already allocated, detached) under `root`. Fails if the
/// key is already present, leaving the tree untouched.
pub(crate) fn insert<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    idx: usize,
    cmp: &C,
) -> Result<usize, usize> {
    match root {
        None => Ok(idx),
        Some(t) => {
            let (go_left, key_eq) = {
                let n = arena.get(t);
                let key = &arena.get(idx).key;
                if cmp.less(key, &n.key) {
                    (true, false)
                } else if cmp.less(&n.key, key) {
                    (false, false)
                } else {
                    (false, true)
                }
            };
            if key_eq {
                return Err(t);
            }
            if go_left {
                let l = arena.get(t).left;
                let new_l = insert(arena, l, idx, cmp)?;
                arena.get_mut(t).left = Some(new_l);
            } else {
                let r = arena.get(t).right;
                let new_r = insert(arena, r, idx, cmp)?;
                arena.get_mut(t).right = Some(new_r);
            }
            update_count(arena, t);
            Ok(t)
        }
    }
}

/// Insert `idx`, always succeeding; equal keys land in the right subtree.
pub(crate) fn insert_dup<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    idx: usize,
    cmp: &C,
) -> usize {
    match root {
        None => idx,
        Some(t) => {
            let go_left = {
                let n = arena.get(t);
                let key = &arena.get(idx).key;
                cmp.less(key, &n.key)
            };
            if go_left {
                let l = arena.get(t).left;
                let new_l = insert_dup(arena, l, idx, cmp);
                arena.get_mut(t).left = Some(new_l);
            } else {
                let r = arena.get(t).right;
                let new_r = insert_dup(arena, r, idx, cmp);
                arena.get_mut(t).right = Some(new_r);
            }
            update_count(arena, t);
            t
        }
    }
}

/// Outcome of [`split_by_key`]: either the tree was split, or (non-dup
/// variant, key present) nothing was touched and the original root is
/// still valid as-is.
pub(crate) enum SplitOutcome {
    Split(Option<usize>, Option<usize>),
    Unchanged,
}

/// Split `root` by `key`: left keys `< key`, right keys `> key`. If `dup`
/// is false and `key` is present, returns [`SplitOutcome::Unchanged`] and
/// leaves every node's links untouched. If `dup` is true, the node equal
/// to `key` (if any) is placed at the right tree's minimum position, and
/// the split always happens.
pub(crate) fn split_by_key<K, V, C: Comparator<K>>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
    dup: bool,
) -> SplitOutcome {
    let Some(t) = root else {
        return SplitOutcome::Split(None, None);
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
    if eq && !dup {
        return SplitOutcome::Unchanged;
    }
    if eq {
        // dup: detach t, and recurse into its left subtree to keep splitting finer matches out;
        // t itself (and everything from its right) becomes part of R, with t as R's minimum.
        let l = arena.get(t).left;
        let r = arena.get(t).right;
        arena.get_mut(t).left = None;
        let new_right_root = join_exclusive(arena, Some(t), r);
        return SplitOutcome::Split(l, Some(new_right_root));
    }
    if go_left {
        let l = arena.get(t).left;
        match split_by_key(arena, l, key, cmp, dup) {
            SplitOutcome::Unchanged => SplitOutcome::Unchanged,
            SplitOutcome::Split(ll, lr) => {
                arena.get_mut(t).left = lr;
                update_count(arena, t);
                SplitOutcome::Split(ll, Some(t))
            }
        }
    } else {
        let r = arena.get(t).right;
        match split_by_key(arena, r, key, cmp, dup) {
            SplitOutcome::Unchanged => SplitOutcome::Unchanged,
            SplitOutcome::Split(rl, rr) => {
                arena.get_mut(t).right = rl;
                update_count(arena, t);
                SplitOutcome::Split(Some(t), rr)
            }
        }
    }
}

/// Split `root` by position `i` (0-indexed): left has the first `i` keys
/// in order, right has the rest.
pub(crate) fn split_by_pos<K, V>(
    arena: &mut Arena<K, V>,
    root: Option<usize>,
    i: usize,
) -> (Option<usize>, Option<usize>) {
    let Some(t) = root else {
        return (None, None);
    };
    let left_count = count(arena, arena.get(t).left);
    if i <= left_count {
        let l = arena.get(t).left;
        let (ll, lr) = split_by_pos(arena, l, i);
        arena.get_mut(t).left = lr;
        update_count(arena, t);
        (ll, Some(t))
    } else {
        let r = arena.get(t).right;
        let (rl, rr) = split_by_pos(arena, r, i - left_count - 1);
        arena.get_mut(t).right = rl;
        update_count(arena, t);
        (Some(t), rr)
    }
}

/// Join two trees whose key ranges are disjoint and ordered
/// (`max(a) < min(b)`); attaches `b` along `a`'s rightmost spine (or
/// returns `b` if `a` is empty).
pub(crate) fn join_exclusive<K, V>(
    arena: &mut Arena<K, V>,
    a: Option<usize>,
    b: Option<usize>,
) -> usize {
    match (a, b) {
        (None, None) => panic!("join_exclusive of two empty trees has no root"),
        (Some(t), None) => t,
        (None, Some(t)) => t,
        (Some(ta), Some(_)) => {
            let r = arena.get(ta).right;
            let new_r = join_exclusive(arena, r, b);
            arena.get_mut(ta).right = Some(new_r);
            update_count(arena, ta);
            ta
        }
    }
}

/// Move every node of the subtree rooted at `idx` out of `src` and into
/// `dst`, preserving structure. Used when a split or join needs to hand
/// one half of a tree its own independent arena.
pub(crate) fn extract_subtree<K, V>(
    src: &mut Arena<K, V>,
    dst: &mut Arena<K, V>,
    idx: Option<usize>,
) -> Option<usize> {
    let i = idx?;
    let (l, r) = {
        let n = src.get(i);
        (n.left, n.right)
    };
    let new_l = extract_subtree(src, dst, l);
    let new_r = extract_subtree(src, dst, r);
    let (k, v) = src.dealloc(i);
    let new_i = dst.alloc(k, v);
    dst.get_mut(new_i).left = new_l;
    dst.get_mut(new_i).right = new_r;
    update_count(dst, new_i);
    Some(new_i)
}

/// `i`-th key in order (0-indexed order statistic).
pub(crate) fn select<K, V>(arena: &Arena<K, V>, root: Option<usize>, i: usize) -> Option<usize> {
    let t = root?;
    let left_count = count(arena, arena.get(t).left);
    use std::cmp::Ordering;
    match i.cmp(&left_count) {
        Ordering::Less => select(arena, arena.get(t).left, i),
        Ordering::Equal => Some(t),
        Ordering::Greater => select(arena, arena.get(t).right, i - left_count - 1),
    }
}

/// In-order rank of `key` plus the node, if present. If absent, returns
/// the rank the key would occupy (−1 below the minimum, `count(t)` above
/// the maximum) along with the in-order-adjacent node, if any.
pub(crate) fn find_position<K, V, C: Comparator<K>>(
    arena: &Arena<K, V>,
    root: Option<usize>,
    key: &K,
    cmp: &C,
) -> (i64, Option<usize>) {
    let mut cur = root;
    let mut rank_offset: i64 = 0;
    let mut adjacent: Option<usize> = None;
    while let Some(i) = cur {
        let n = arena.get(i);
        if cmp.less(key, &n.key) {
            adjacent = Some(i);
            cur = n.left;
        } else if cmp.less(&n.key, key) {
            let left_count = count(arena, n.left);
            rank_offset += (left_count + 1) as i64;
            adjacent = Some(i);
            cur = n.right;
        } else {
            let left_count = count(arena, n.left);
            return (rank_offset + left_count as i64, Some(i));
        }
    }
    (rank_offset - 1, adjacent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NaturalOrder;

    fn in_order(arena: &Arena<i32, ()>, root: Option<usize>, out: &mut Vec<i32>) {
        if let Some(t) = root {
            in_order(arena, arena.get(t).left, out);
            out.push(arena.get(t).key);
            in_order(arena, arena.get(t).right, out);
        }
    }

    #[test]
    fn insert_keeps_sorted_order_and_counts() {
        let mut arena = Arena::new();
        let mut root = None;
        for k in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
            let idx = arena.alloc(k, ());
            root = Some(insert(&mut arena, root, idx, &NaturalOrder).unwrap());
        }
        let mut out = Vec::new();
        in_order(&arena, root, &mut out);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(count(&arena, root), 9);
    }

    #[test]
    fn insert_duplicate_fails() {
        let mut arena = Arena::new();
        let idx1 = arena.alloc(5, ());
        let root = insert(&mut arena, None, idx1, &NaturalOrder).unwrap();
        let idx2 = arena.alloc(5, ());
        let err = insert(&mut arena, Some(root), idx2, &NaturalOrder).unwrap_err();
        assert_eq!(err, root);
    }

    #[test]
    fn select_and_find_position_agree() {
        let mut arena = Arena::new();
        let mut root = None;
        for k in 0..20 {
            let idx = arena.alloc(k, ());
            root = Some(insert(&mut arena, root, idx, &NaturalOrder).unwrap());
        }
        for k in 0..20 {
            let (rank, node) = find_position(&arena, root, &k, &NaturalOrder);
            let selected = select(&arena, root, rank as usize).unwrap();
            assert_eq!(arena.get(node.unwrap()).key, k);
            assert_eq!(arena.get(selected).key, k);
        }
        let (rank_below, _) = find_position(&arena, root, &-1, &NaturalOrder);
        assert_eq!(rank_below, -1);
        let (rank_above, _) = find_position(&arena, root, &20, &NaturalOrder);
        assert_eq!(rank_above, count(&arena, root) as i64);
    }

    #[test]
    fn split_and_join_round_trip() {
        let mut arena = Arena::new();
        let mut root = None;
        for k in 0..10 {
            let idx = arena.alloc(k, ());
            root = Some(insert(&mut arena, root, idx, &NaturalOrder).unwrap());
        }
        // 5 is present: non-dup split reports Unchanged and leaves the tree whole.
        assert!(matches!(
            split_by_key(&mut arena, root, &5, &NaturalOrder, false),
            SplitOutcome::Unchanged
        ));
        let mut out_whole = Vec::new();
        in_order(&arena, root, &mut out_whole);
        assert_eq!(out_whole, (0..10).collect::<Vec<_>>());

        // a key not present always splits cleanly.
        match split_by_key(&mut arena, root, &5, &NaturalOrder, true) {
            SplitOutcome::Split(l, r) => {
                let mut out_l = Vec::new();
                in_order(&arena, l, &mut out_l);
                let mut out_r = Vec::new();
                in_order(&arena, r, &mut out_r);
                assert_eq!(out_l, vec![0, 1, 2, 3, 4]);
                assert_eq!(out_r, vec![5, 6, 7, 8, 9]);
            }
            SplitOutcome::Unchanged => panic!("dup split should always split"),
        }
    }

    #[test]
    fn split_by_pos_splits_by_rank() {
        let mut arena = Arena::new();
        let mut root = None;
        for k in 0..10 {
            let idx = arena.alloc(k, ());
            root = Some(insert(&mut arena, root, idx, &NaturalOrder).unwrap());
        }
        let (l, r) = split_by_pos(&mut arena, root, 4);
        let mut out_l = Vec::new();
        in_order(&arena, l, &mut out_l);
        let mut out_r = Vec::new();
        in_order(&arena, r, &mut out_r);
        assert_eq!(out_l, vec![0, 1, 2, 3]);
        assert_eq!(out_r, vec![4, 5, 6, 7, 8, 9]);
    }
}
