//! Generic Huffman codec.
//!
//! Frequencies accumulate per symbol, a prefix tree is built by
//! repeatedly pulling the two lowest-frequency subtrees off
//! [`crate::heap::BinHeap`] and merging them, and codes are the root-to-leaf
//! paths of that tree (`0` left, `1` right). The encoded/decoded
//! bitstream and the tree's Łukasiewicz-word serialization both use
//! `bit_vec::BitVec`, matching the rest of this crate's bit-level work.

use std::collections::HashMap;
use std::hash::Hash;

use bit_vec::BitVec;

use crate::error::{AResult, Error};
use crate::heap::BinHeap;

/// A node of the Huffman prefix tree: a leaf carries one symbol, an
/// internal node carries its two children (`0` edge then `1` edge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode<S> {
    Leaf(S),
    Internal(Box<TreeNode<S>>, Box<TreeNode<S>>),
}

/// Stateful Huffman encoder/decoder over symbol type `S`.
///
/// Phases: accumulate frequencies (`observe`/`set_freq`), designate the
/// end-of-stream symbol (`set_end_of_stream`), then `build_tree`. Only
/// after the tree is built can `encode`/`decode` run.
pub struct HuffmanCodec<S: Clone + Eq + Hash> {
    freqs: HashMap<S, u64>,
    order: Vec<S>,
    end_of_stream: Option<S>,
    tree: Option<TreeNode<S>>,
    codes: HashMap<S, BitVec>,
}

impl<S: Clone + Eq + Hash> Default for HuffmanCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Eq + Hash> HuffmanCodec<S> {
    pub fn new() -> Self {
        Self { freqs: HashMap::new(), order: Vec::new(), end_of_stream: None, tree: None, codes: HashMap::new() }
    }

    pub fn is_tree_built(&self) -> bool {
        self.tree.is_some()
    }

    /// Rebuild a codec from an already-serialized tree (e.g. read back
    /// from a compressed file's header), skipping frequency
    /// accumulation entirely. Only `encode`/`decode` are meaningful on
    /// the result.
    pub fn from_tree(tree: TreeNode<S>, end_of_stream: S) -> Self {
        let mut codec =
            Self { freqs: HashMap::new(), order: Vec::new(), end_of_stream: Some(end_of_stream), tree: None, codes: HashMap::new() };
        codec.derive_codes(&tree);
        codec.tree = Some(tree);
        codec
    }

    /// Increment `symbol`'s accumulated frequency by one (reading a
    /// stream one symbol at a time).
    pub fn observe(&mut self, symbol: S) -> AResult<()> {
        self.set_freq_internal(symbol, 1, true)
    }

    /// Set `symbol`'s frequency to an explicit absolute value.
    pub fn set_freq(&mut self, symbol: S, f: u64) -> AResult<()> {
        self.set_freq_internal(symbol, f, false)
    }

    fn set_freq_internal(&mut self, symbol: S, f: u64, accumulate: bool) -> AResult<()> {
        if self.tree.is_some() {
            return Err(Error::FrequencyAfterTreeBuilt);
        }
        match self.freqs.get_mut(&symbol) {
            Some(existing) if accumulate => *existing += f,
            Some(existing) => *existing = f,
            None => {
                self.order.push(symbol.clone());
                self.freqs.insert(symbol, f);
            }
        }
        Ok(())
    }

    pub fn set_end_of_stream(&mut self, e: S) -> AResult<()> {
        if self.end_of_stream.is_some() {
            return Err(Error::EndOfStreamAlreadySet);
        }
        self.end_of_stream = Some(e);
        Ok(())
    }

    /// Build the prefix tree from the frequencies accumulated so far.
    /// After this, `set_freq`/`observe` are errors.
    pub fn build_tree(&mut self) -> AResult<()> {
        let end = self.end_of_stream.clone().ok_or(Error::UnsetEndOfStream)?;
        if !self.freqs.contains_key(&end) {
            self.order.push(end.clone());
            self.freqs.insert(end.clone(), 0);
        }
        if self.freqs.is_empty() {
            return Err(Error::EmptyContainer);
        }
        let mut heap: BinHeap<u64, TreeNode<S>> = BinHeap::new();
        for sym in &self.order {
            heap.insert(self.freqs[sym], TreeNode::Leaf(sym.clone()));
        }
        while heap.len() >= 2 {
            let (f1, n1) = heap.extract_min().expect("len >= 2");
            let (f2, n2) = heap.extract_min().expect("len >= 2");
            heap.insert(f1 + f2, TreeNode::Internal(Box::new(n1), Box::new(n2)));
        }
        let (_, root) = heap.extract_min().expect("at least one symbol was observed");
        self.derive_codes(&root);
        self.tree = Some(root);
        Ok(())
    }

    fn derive_codes(&mut self, root: &TreeNode<S>) {
        self.codes.clear();
        let mut path = BitVec::new();
        Self::walk_codes(root, &mut path, &mut self.codes);
    }

    fn walk_codes(node: &TreeNode<S>, path: &mut BitVec, codes: &mut HashMap<S, BitVec>) {
        match node {
            TreeNode::Leaf(s) => {
                codes.insert(s.clone(), path.clone());
            }
            TreeNode::Internal(l, r) => {
                path.push(false);
                Self::walk_codes(l, path, codes);
                path.pop();
                path.push(true);
                Self::walk_codes(r, path, codes);
                path.pop();
            }
        }
    }

    pub fn code_of(&self, symbol: &S) -> Option<&BitVec> {
        self.codes.get(symbol)
    }

    /// Append each symbol's code, then the end-of-stream symbol's code.
    pub fn encode(&self, data: impl IntoIterator<Item = S>) -> AResult<BitVec> {
        let end = self.end_of_stream.clone().ok_or(Error::UnsetEndOfStream)?;
        let mut out = BitVec::new();
        for symbol in data {
            let code = self.codes.get(&symbol).ok_or(Error::UnknownSymbol)?;
            for bit in code.iter() {
                out.push(bit);
            }
        }
        let end_code = self.codes.get(&end).ok_or(Error::UnknownSymbol)?;
        for bit in end_code.iter() {
            out.push(bit);
        }
        Ok(out)
    }

    /// Decode until the end-of-stream symbol is emitted (it is not
    /// included in the returned symbols), or until `bits` is exhausted
    /// mid-descent, which is a malformed stream.
    pub fn decode(&self, bits: &BitVec) -> AResult<Vec<S>> {
        let root = self.tree.as_ref().ok_or(Error::UnsetEndOfStream)?;
        let end = self.end_of_stream.as_ref().ok_or(Error::UnsetEndOfStream)?;
        let mut out = Vec::new();
        let mut iter = bits.iter();
        let mut cur = root;
        loop {
            match cur {
                TreeNode::Leaf(s) => {
                    if s == end {
                        return Ok(out);
                    }
                    out.push(s.clone());
                    cur = root;
                }
                TreeNode::Internal(l, r) => {
                    let bit = iter.next().ok_or(Error::MalformedBitStream)?;
                    cur = if bit { r.as_ref() } else { l.as_ref() };
                }
            }
        }
    }

    /// Serialize the prefix tree as a Łukasiewicz bit word (`1` =
    /// internal node, `0` = leaf) followed by leaf keys in prefix order.
    pub fn serialize_tree(&self) -> AResult<(BitVec, Vec<S>)> {
        let root = self.tree.as_ref().ok_or(Error::UnsetEndOfStream)?;
        let mut bits = BitVec::new();
        let mut keys = Vec::new();
        Self::walk_serialize(root, &mut bits, &mut keys);
        Ok((bits, keys))
    }

    fn walk_serialize(node: &TreeNode<S>, bits: &mut BitVec, keys: &mut Vec<S>) {
        match node {
            TreeNode::Leaf(s) => {
                bits.push(false);
                keys.push(s.clone());
            }
            TreeNode::Internal(l, r) => {
                bits.push(true);
                Self::walk_serialize(l, bits, keys);
                Self::walk_serialize(r, bits, keys);
            }
        }
    }
}

/// Rebuild a prefix tree from a Łukasiewicz bit word and its leaf keys
/// (the inverse of [`HuffmanCodec::serialize_tree`]).
pub fn deserialize_tree<S: Clone>(bits: &BitVec, keys: &[S]) -> AResult<TreeNode<S>> {
    let mut bit_iter = bits.iter();
    let mut key_iter = keys.iter().cloned();
    build_from_word(&mut bit_iter, &mut key_iter)
}

fn build_from_word<S: Clone>(
    bit_iter: &mut impl Iterator<Item = bool>,
    key_iter: &mut impl Iterator<Item = S>,
) -> AResult<TreeNode<S>> {
    let bit = bit_iter
        .next()
        .ok_or_else(|| Error::MalformedTree("bit word ended before the tree was complete".into()))?;
    if bit {
        let left = build_from_word(bit_iter, key_iter)?;
        let right = build_from_word(bit_iter, key_iter)?;
        Ok(TreeNode::Internal(Box::new(left), Box::new(right)))
    } else {
        let key = key_iter
            .next()
            .ok_or_else(|| Error::MalformedTree("key list ended before the bit word".into()))?;
        Ok(TreeNode::Leaf(key))
    }
}

impl HuffmanCodec<Vec<u8>> {
    /// `NAME_cdp[] = { 0, 1, ... };` for the Łukasiewicz bit word and
    /// `NAME_k[] = { "..", nullptr };` for the hex-encoded leaf keys.
    pub fn to_c_arrays(&self, bits_name: &str, keys_name: &str) -> AResult<(String, String)> {
        let (bits, keys) = self.serialize_tree()?;
        let bits_body: Vec<&str> = bits.iter().map(|b| if b { "1" } else { "0" }).collect();
        let bits_decl =
            format!("const unsigned char {bits_name}[] = {{ {} }};", bits_body.join(", "));
        let mut key_literals: Vec<String> =
            keys.iter().map(|k| format!("\"{}\"", hex::encode(k))).collect();
        key_literals.push("nullptr".to_string());
        let keys_decl = format!("const char* {keys_name}[] = {{ {} }};", key_literals.join(", "));
        Ok((bits_decl, keys_decl))
    }

    pub fn from_c_arrays(bits_decl: &str, keys_decl: &str) -> AResult<TreeNode<Vec<u8>>> {
        let bits = parse_bit_literal(bits_decl)?;
        let keys = parse_key_literal(keys_decl)?;
        deserialize_tree(&bits, &keys)
    }
}

fn braces(decl: &str) -> AResult<&str> {
    let open = decl
        .find('{')
        .ok_or_else(|| Error::MalformedTree("missing '{' in declaration".into()))?;
    let close = decl
        .rfind('}')
        .ok_or_else(|| Error::MalformedTree("missing '}' in declaration".into()))?;
    if close <= open {
        return Err(Error::MalformedTree("malformed braces in declaration".into()));
    }
    Ok(&decl[open + 1..close])
}

fn parse_bit_literal(decl: &str) -> AResult<BitVec> {
    let inner = braces(decl)?;
    let mut bits = BitVec::new();
    for tok in inner.split(',') {
        let tok = tok.trim();
        if tok.is_empty() {
            continue;
        }
        match tok {
            "0" => bits.push(false),
            "1" => bits.push(true),
            other => return Err(Error::MalformedTree(format!("bad bit token {other:?}"))),
        }
    }
    Ok(bits)
}

fn parse_key_literal(decl: &str) -> AResult<Vec<Vec<u8>>> {
    let inner = braces(decl)?;
    let mut keys = Vec::new();
    for tok in inner.split(',') {
        let tok = tok.trim();
        if tok.is_empty() || tok == "nullptr" || tok == "NULL" {
            continue;
        }
        let unquoted = tok.trim_matches('"');
        let bytes = hex::decode(unquoted)
            .map_err(|_| Error::MalformedTree(format!("bad hex key literal {tok:?}")))?;
        keys.push(bytes);
    }
    Ok(keys)
}
