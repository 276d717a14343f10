//! Binary heap realized as a pointer tree rather than the usual flat
//! array. Insertion locates the next leaf in level order
//! by walking bit-by-bit from the root (the binary digits of the new
//! node's 1-indexed level-order position, after the leading `1`, name
//! the left/right turns to take); the same walk locates the current
//! last node for extraction. Handles stay valid across sifts because a
//! sift swaps only a node's payload (`key`, `value`, `handle`) between
//! two tree positions, never the positions' structural links.

use crate::tree::{Comparator, NaturalOrder};

struct Node<K, V> {
    key: K,
    value: V,
    handle: usize,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
}

enum Slot<K, V> {
    Occupied(Node<K, V>),
    Free(Option<usize>),
}

enum HandleSlot {
    Occupied(usize),
    Free(Option<usize>),
}

/// A binary min-heap keyed by `K`, carrying payload `V`, addressed by
/// stable `usize` handles instead of raw tree positions.
pub struct BinHeap<K, V, C: Comparator<K> = NaturalOrder> {
    slots: Vec<Slot<K, V>>,
    free_slot: Option<usize>,
    handles: Vec<HandleSlot>,
    free_handle: Option<usize>,
    root: Option<usize>,
    len: usize,
    cmp: C,
}

impl<K: Ord, V> BinHeap<K, V, NaturalOrder> {
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K: Ord, V> Default for BinHeap<K, V, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Comparator<K>> BinHeap<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            slots: Vec::new(),
            free_slot: None,
            handles: Vec::new(),
            free_handle: None,
            root: None,
            len: 0,
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn get(&self, idx: usize) -> &Node<K, V> {
        match &self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling heap node index"),
        }
    }

    fn get_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        match &mut self.slots[idx] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling heap node index"),
        }
    }

    fn alloc_slot(&mut self, node: Node<K, V>) -> usize {
        match self.free_slot {
            Some(i) => {
                self.free_slot = match &self.slots[i] {
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

    fn dealloc_slot(&mut self, idx: usize) -> Node<K, V> {
        let old = std::mem::replace(&mut self.slots[idx], Slot::Free(self.free_slot));
        self.free_slot = Some(idx);
        match old {
            Slot::Occupied(n) => n,
            Slot::Free(_) => unreachable!("double free of heap node"),
        }
    }

    fn alloc_handle(&mut self, arena_idx: usize) -> usize {
        match self.free_handle {
            Some(i) => {
                self.free_handle = match &self.handles[i] {
                    HandleSlot::Free(next) => *next,
                    HandleSlot::Occupied(_) => unreachable!(),
                };
                self.handles[i] = HandleSlot::Occupied(arena_idx);
                i
            }
            None => {
                self.handles.push(HandleSlot::Occupied(arena_idx));
                self.handles.len() - 1
            }
        }
    }

    fn dealloc_handle(&mut self, handle: usize) {
        self.handles[handle] = HandleSlot::Free(self.free_handle);
        self.free_handle = Some(handle);
    }

    fn slot_of(&self, handle: usize) -> usize {
        match self.handles[handle] {
            HandleSlot::Occupied(idx) => idx,
            HandleSlot::Free(_) => panic!("dangling heap handle"),
        }
    }

    fn retarget_handle(&mut self, handle: usize, arena_idx: usize) {
        self.handles[handle] = HandleSlot::Occupied(arena_idx);
    }

    /// Walk from the root to the `pos`-th node in level order (1-indexed),
    /// following the binary digits of `pos` after its leading `1`.
    fn locate(&self, pos: usize) -> Option<usize> {
        let mut cur = self.root?;
        if pos <= 1 {
            return Some(cur);
        }
        let total_bits = usize::BITS - pos.leading_zeros();
        for shift in (0..total_bits - 1).rev() {
            let bit = (pos >> shift) & 1;
            cur = if bit == 1 { self.get(cur).right? } else { self.get(cur).left? };
        }
        Some(cur)
    }

    pub fn is_leaf(&self, handle: usize) -> bool {
        let n = self.get(self.slot_of(handle));
        n.left.is_none() && n.right.is_none()
    }

    pub fn is_left(&self, handle: usize) -> bool {
        let idx = self.slot_of(handle);
        match self.get(idx).parent {
            None => false,
            Some(p) => self.get(p).left == Some(idx),
        }
    }

    pub fn peek_min(&self) -> Option<(&K, &V)> {
        self.root.map(|r| {
            let n = self.get(r);
            (&n.key, &n.value)
        })
    }

    pub fn get_key_value(&self, handle: usize) -> (&K, &V) {
        let n = self.get(self.slot_of(handle));
        (&n.key, &n.value)
    }

    /// Swap `key`/`value`/`handle` between two tree positions, keeping
    /// each position's structural links (`parent`/`left`/`right`) fixed,
    /// and re-point the moved handles at their new positions.
    fn swap_payload(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi);
        let node_lo = match &mut left[lo] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling heap node index"),
        };
        let node_hi = match &mut right[0] {
            Slot::Occupied(n) => n,
            Slot::Free(_) => panic!("dangling heap node index"),
        };
        std::mem::swap(&mut node_lo.key, &mut node_hi.key);
        std::mem::swap(&mut node_lo.value, &mut node_hi.value);
        std::mem::swap(&mut node_lo.handle, &mut node_hi.handle);
        let (handle_lo, handle_hi) = (node_lo.handle, node_hi.handle);
        self.retarget_handle(handle_lo, lo);
        self.retarget_handle(handle_hi, hi);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while let Some(p) = self.get(idx).parent {
            if self.cmp.less(&self.get(idx).key, &self.get(p).key) {
                self.swap_payload(idx, p);
                idx = p;
            } else {
                break;
            }
        }
    }

    fn smaller_child(&self, idx: usize) -> Option<usize> {
        let n = self.get(idx);
        match (n.left, n.right) {
            (None, None) => None,
            (Some(l), None) => Some(l),
            (None, Some(r)) => Some(r),
            (Some(l), Some(r)) => {
                if self.cmp.less(&self.get(r).key, &self.get(l).key) {
                    Some(r)
                } else {
                    Some(l)
                }
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let Some(child) = self.smaller_child(idx) else { break };
            if self.cmp.less(&self.get(child).key, &self.get(idx).key) {
                self.swap_payload(idx, child);
                idx = child;
            } else {
                break;
            }
        }
    }

    /// Insert `key -> value`, returning a stable handle for later
    /// `update`/`remove` calls.
    pub fn insert(&mut self, key: K, value: V) -> usize {
        let pos = self.len + 1;
        let handle = self.alloc_handle(usize::MAX);
        let node = Node { key, value, handle, parent: None, left: None, right: None };
        let idx = self.alloc_slot(node);
        self.retarget_handle(handle, idx);
        if pos == 1 {
            self.root = Some(idx);
        } else {
            let parent = self.locate(pos / 2).expect("parent of a non-root position exists");
            self.get_mut(idx).parent = Some(parent);
            if pos % 2 == 0 {
                self.get_mut(parent).left = Some(idx);
            } else {
                self.get_mut(parent).right = Some(idx);
            }
        }
        self.len += 1;
        self.sift_up(idx);
        handle
    }

    fn detach_last(&mut self) -> usize {
        let last = self.locate(self.len).expect("heap is non-empty");
        if let Some(p) = self.get(last).parent {
            if self.get(p).left == Some(last) {
                self.get_mut(p).left = None;
            } else {
                self.get_mut(p).right = None;
            }
        }
        last
    }

    /// Remove and return the minimum key/value pair.
    pub fn extract_min(&mut self) -> Option<(K, V)> {
        let root = self.root?;
        let last = self.detach_last();
        self.len -= 1;
        if root == last {
            self.root = None;
            let removed = self.dealloc_slot(root);
            self.dealloc_handle(removed.handle);
            return Some((removed.key, removed.value));
        }
        self.swap_payload(root, last);
        let removed = self.dealloc_slot(last);
        self.dealloc_handle(removed.handle);
        self.sift_down(root);
        Some((removed.key, removed.value))
    }

    /// Remove an arbitrary node by handle: extract-min if it is the
    /// root, remove-last if it is the last node, otherwise replace it
    /// with the current last and restore order with one sift-down then
    /// one sift-up.
    pub fn remove(&mut self, handle: usize) -> Option<(K, V)> {
        let idx = self.slot_of(handle);
        if Some(idx) == self.root {
            return self.extract_min();
        }
        let last = self.locate(self.len)?;
        if idx == last {
            self.detach_last();
            self.len -= 1;
            let removed = self.dealloc_slot(idx);
            self.dealloc_handle(removed.handle);
            return Some((removed.key, removed.value));
        }
        self.detach_last();
        self.len -= 1;
        self.swap_payload(idx, last);
        let removed = self.dealloc_slot(last);
        self.dealloc_handle(removed.handle);
        self.sift_down(idx);
        self.sift_up(idx);
        Some((removed.key, removed.value))
    }

    /// Replace the key at `handle` and restore heap order.
    pub fn update_key(&mut self, handle: usize, new_key: K) {
        let idx = self.slot_of(handle);
        self.get_mut(idx).key = new_key;
        self.sift_down(idx);
        self.sift_up(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_invariants_hold<K: Ord, V>(h: &BinHeap<K, V>) {
        fn walk<K: Ord, V>(h: &BinHeap<K, V>, idx: usize) {
            let n = h.get(idx);
            if let Some(l) = n.left {
                assert!(!(h.get(l).key < n.key));
                assert_eq!(h.get(l).parent, Some(idx));
                walk(h, l);
            }
            if let Some(r) = n.right {
                assert!(!(h.get(r).key < n.key));
                assert_eq!(h.get(r).parent, Some(idx));
                walk(h, r);
            }
        }
        if let Some(r) = h.root {
            walk(h, r);
        }
    }

    #[test]
    fn extract_min_yields_sorted_order() {
        let mut h: BinHeap<i32, &str> = BinHeap::new();
        for k in [5, 3, 8, 1, 9, 2, 7, 4, 6, 0] {
            h.insert(k, "x");
            all_invariants_hold(&h);
        }
        let mut out = Vec::new();
        while let Some((k, _)) = h.extract_min() {
            out.push(k);
            all_invariants_hold(&h);
        }
        assert_eq!(out, (0..10).collect::<Vec<_>>());
        assert!(h.is_empty());
    }

    #[test]
    fn remove_arbitrary_handle_preserves_order() {
        let mut h: BinHeap<i32, i32> = BinHeap::new();
        let mut handles = Vec::new();
        for k in 0..30 {
            handles.push(h.insert(k, k));
        }
        // remove a handle that isn't the current min or last.
        let removed = h.remove(handles[17]);
        assert_eq!(removed, Some((17, 17)));
        all_invariants_hold(&h);
        assert_eq!(h.len(), 29);
        let mut out = Vec::new();
        while let Some((k, _)) = h.extract_min() {
            out.push(k);
        }
        let expected: Vec<i32> = (0..30).filter(|&k| k != 17).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn update_key_resifts_up_and_down() {
        let mut h: BinHeap<i32, &str> = BinHeap::new();
        let a = h.insert(10, "a");
        h.insert(20, "b");
        h.insert(30, "c");
        h.insert(40, "d");
        h.update_key(a, 100);
        all_invariants_hold(&h);
        assert_eq!(h.peek_min().map(|(k, _)| *k), Some(20));
        let lowest = h.insert(0, "z");
        let _ = lowest;
        assert_eq!(h.peek_min().map(|(k, _)| *k), Some(0));
    }

    #[test]
    fn is_leaf_and_is_left_track_shape() {
        let mut h: BinHeap<i32, ()> = BinHeap::new();
        let root = h.insert(1, ());
        let left = h.insert(2, ());
        let right = h.insert(3, ());
        assert!(!h.is_leaf(root));
        assert!(h.is_leaf(left));
        assert!(h.is_leaf(right));
        assert!(h.is_left(left));
        assert!(!h.is_left(right));
    }

    #[test]
    fn empty_heap_extract_is_none() {
        let mut h: BinHeap<i32, ()> = BinHeap::new();
        assert_eq!(h.extract_min(), None);
    }
}
