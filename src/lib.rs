//! A small, arena-backed protobuf wire codec driven by a runtime schema
//! ("MiniTable") rather than per-message generated code.
//!
//! ```text
//! bytes --[decode]--> Message (backed by an Arena, shaped by a MiniTable) --[encode]--> bytes
//! ```
//!
//! There is no `.proto` compiler in this crate: a [`MiniTable`] describing a
//! message's fields is the whole contract. [`bootstrap`] hand-writes the
//! tables for `descriptor.proto`/`plugin.proto` needed to build a code
//! generator *on top of* this crate; generating tables for arbitrary
//! application messages is that generator's job, not this one's.
//!
//! # Layout
//!
//! - [`arena`] — the bump allocator every [`Message`] and its field storage
//!   comes from.
//! - [`minitable`] — the runtime schema model ([`MiniTable`],
//!   [`MiniTableField`], [`FieldType`]).
//! - [`message`] — dynamic message storage ([`Message`], [`StringView`],
//!   [`RepeatedField`]) addressed by a `MiniTable`'s offsets.
//! - [`wire`] — tag/varint/length-delimited primitives.
//! - [`decode`] / [`encode`] — the two directions of the codec.
//! - [`error`] — [`DecodeError`]/[`EncodeError`].
//! - [`bootstrap`] — hand-coded tables for `descriptor.proto`/`plugin.proto`.

pub mod arena;
pub mod bootstrap;
pub mod decode;
pub mod encode;
pub mod error;
pub mod message;
pub mod minitable;
pub mod wire;

pub use arena::{Arena, ArenaError};
pub use decode::{decode as decode_message, DecodeOptions};
pub use encode::{encode as encode_message, EncodeOptions};
pub use error::{DecodeError, EncodeError};
pub use message::{Message, RepeatedField, StringView};
pub use minitable::{FieldMode, FieldType, MiniTable, MiniTableField};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minitable::NO_SUBMESSAGE;
    use allocator_api2::alloc::Global;

    const FIELDS: &[MiniTableField] = &[MiniTableField::new(
        1,
        8,
        1,
        FieldType::Int32,
        FieldMode::Scalar,
        false,
    )];

    static TABLE: MiniTable = MiniTable {
        fields: FIELDS,
        submessages: &[],
        size: 16,
        hasbit_bytes: 1,
        oneof_count: 0,
        dense_below: 1,
    };

    #[test]
    fn public_api_decodes_and_encodes_a_round_trip() {
        let mut arena = Arena::new(&Global);
        let mut input = std::vec::Vec::new();
        wire::write_tag(1, wire::WireType::Varint, &mut input);
        wire::write_varint64(99, &mut input);

        let msg = decode_message(&input, &TABLE, &mut arena, &DecodeOptions::default()).unwrap();
        assert_eq!(msg.get_scalar::<i32>(&FIELDS[0]), 99);
        assert_eq!(FIELDS[0].submsg_index, NO_SUBMESSAGE);

        let mut out_arena = Arena::new(&Global);
        let bytes = encode_message(&msg, &mut out_arena, &EncodeOptions::default()).unwrap();
        assert_eq!(bytes, input.as_slice());
    }
}
