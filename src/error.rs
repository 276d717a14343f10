//! Crate-wide error type.
//!
//! Every container in this crate returns [`AResult`] rather than a bespoke
//! per-module error.

/// All of the failure kinds surfaced by this crate's containers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Insert into a non-duplicate container found the key already present.
    #[error("key already present")]
    DuplicateKey,
    /// Extraction/removal attempted on an empty container.
    #[error("container is empty")]
    EmptyContainer,
    /// An index-based accessor (select, bit array read/write) went out of range.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    /// Reserved: allocation failure during rebalancing or rehashing.
    /// Rust's global allocator aborts the process rather than returning
    /// this, but the variant exists so callers matching on `Error`
    /// compile against a stable surface.
    #[error("allocation failed")]
    AllocationFailed,
    /// A Huffman bit stream descended into a missing child.
    #[error("malformed bit stream")]
    MalformedBitStream,
    /// The text or C-array bit array serialization was malformed.
    #[error("bad bit array format: {0}")]
    BitArrayFormat(String),
    /// A CSV record had fewer fields than required.
    #[error("csv record too short: expected {expected} fields, found {found}")]
    CsvRecordTooShort { expected: usize, found: usize },
    /// `set_freq` was called on a Huffman encoder after its tree was built.
    #[error("cannot set symbol frequency after the Huffman tree is built")]
    FrequencyAfterTreeBuilt,
    /// `set_end_of_stream` was called more than once.
    #[error("end-of-stream symbol already set")]
    EndOfStreamAlreadySet,
    /// `set_end_of_stream` was never called before encode/decode.
    #[error("end-of-stream symbol has not been set")]
    UnsetEndOfStream,
    /// `join_exclusive` precondition (`max(a) < min(b)`) was violated.
    #[error("join_exclusive requires disjoint, ordered key ranges")]
    NonExclusiveJoin,
    /// Lookup of a node/arc/bucket handle that does not exist (or was removed).
    #[error("node or handle not found")]
    NodeMissing,
    /// `encode` saw a symbol with no accumulated frequency and so no code.
    #[error("symbol has no Huffman code")]
    UnknownSymbol,
    /// The Huffman tree or its C-array declaration pair was malformed.
    #[error("malformed huffman tree encoding: {0}")]
    MalformedTree(String),
}

/// Convenience alias used throughout the crate.
pub type AResult<T> = Result<T, Error>;
