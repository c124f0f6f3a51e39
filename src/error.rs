//! Error taxonomy for decode and encode.
//!
//! Grounded on the typed `DecodeError` in `protomon`'s `error.rs` — the one
//! sibling repo in this problem space that gives decode failures a closed,
//! matchable shape instead of a bare `bool`/`anyhow::Error`. Unlike that
//! repo, these enums are plain (no bit-packing into a `NonZeroU64`): this
//! crate isn't chasing register-passing micro-optimizations, so a normal
//! `#[derive(thiserror::Error)]` enum is the idiomatic fit.

use crate::arena::ArenaError;

/// Failures that can occur while decoding a message from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The buffer ended in the middle of a value.
    #[error("truncated input at byte {at}")]
    Truncated { at: usize },

    /// A varint ran past 10 bytes, or its 10th byte had reserved high bits
    /// set.
    #[error("malformed varint at byte {at}")]
    MalformedVarint { at: usize },

    /// Wire type 3 (`SGROUP`) or 4 (`EGROUP`) was encountered. `group`
    /// encoding is out of scope for this codec.
    #[error("unsupported group encoding at byte {at}")]
    UnsupportedGroup { at: usize },

    /// A tag's field number was 0, out of the valid `[1, 2^29-1]` range, or
    /// its wire type was the reserved value 6 or 7.
    #[error("invalid tag at byte {at}")]
    InvalidTag { at: usize },

    /// A `STRING` field's bytes were not valid UTF-8 (only checked when
    /// [`DecodeOptions::check_utf8`](crate::decode::DecodeOptions::check_utf8) is set).
    #[error("invalid UTF-8 in string field {field_number} at byte {at}")]
    BadUtf8 { field_number: u32, at: usize },

    /// Nested-message depth exceeded
    /// [`DecodeOptions::max_depth`](crate::decode::DecodeOptions::max_depth).
    #[error("recursion limit exceeded at depth {depth}")]
    RecursionLimit { depth: u32 },

    /// The arena could not satisfy an allocation.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] ArenaError),

    /// The MiniTable itself was inconsistent (e.g. a `MESSAGE` field whose
    /// `submsg_index` has no corresponding entry). This should be
    /// unreachable for a correctly constructed MiniTable; it exists so a
    /// malformed hand-coded or bootstrap table fails loudly instead of
    /// reading out of bounds.
    #[error("inconsistent MiniTable: {reason}")]
    InvalidTable { reason: &'static str },
}

/// Failures that can occur while encoding a message to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The arena backing the output buffer could not satisfy an allocation.
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] ArenaError),

    /// Nested-message depth exceeded the configured encode depth limit.
    #[error("depth limit exceeded at depth {depth}")]
    DepthExceeded { depth: u32 },
}
