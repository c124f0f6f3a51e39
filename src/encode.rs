//! Two-pass encoder: Message -> bytes.
//!
//! Pass one (`sized_len`) walks the message computing exactly how many bytes
//! it will take to encode, including every nested submessage. Pass two
//! (`write_message`) allocates one arena buffer of that exact size and
//! writes into it directly — no intermediate growable buffer, no
//! re-allocation mid-encode. This mirrors how the teacher's codegen tables
//! separate a message's `computed_size`/`write_into` halves (see
//! `codegen/tables.rs`'s `EncodeTableEntry`), generalized here to run off
//! `MiniTableField` at encode time instead of per-field generated calls.

use crate::arena::Arena;
use crate::error::EncodeError;
use crate::message::Message;
use crate::minitable::{FieldMode, FieldType, MiniTableField};
use crate::wire::{self, WireType};

/// Tunables for one encode call.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Nested-message depth at which encoding fails with
    /// [`EncodeError::DepthExceeded`] rather than overflow the native stack.
    /// A well-formed `Message` tree can only be this deep if it was decoded
    /// with a matching or larger `DecodeOptions::max_depth`, so this mostly
    /// guards hand-built messages.
    pub max_depth: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { max_depth: 100 }
    }
}

/// Encodes `msg` into a buffer allocated from `arena`, sized exactly to the
/// encoding's length.
pub fn encode<'a>(
    msg: &Message,
    arena: &'a mut Arena,
    options: &EncodeOptions,
) -> Result<&'a [u8], EncodeError> {
    let total = message_len(msg, options, 0)?;
    if total == 0 {
        return Ok(&[]);
    }
    let ptr = arena.alloc(total, 1)?;
    // Safety: `ptr` is a fresh allocation of exactly `total` bytes; nothing
    // else aliases it until this function returns the slice to the caller.
    let buf = unsafe { core::slice::from_raw_parts_mut(ptr.as_ptr(), total) };
    let end = write_message(msg, buf, 0, options, 0)?;
    debug_assert_eq!(end, total, "size pass and write pass disagree");
    Ok(buf)
}

fn message_len(msg: &Message, options: &EncodeOptions, depth: u32) -> Result<usize, EncodeError> {
    if depth > options.max_depth {
        return Err(EncodeError::DepthExceeded { depth });
    }
    let mut total = 0usize;
    for field in msg.table.fields {
        total += field_len(msg, field, options, depth)?;
    }
    Ok(total)
}

fn field_len(
    msg: &Message,
    field: &MiniTableField,
    options: &EncodeOptions,
    depth: u32,
) -> Result<usize, EncodeError> {
    if field.mode == FieldMode::Repeated {
        return repeated_field_len(msg, field, options, depth);
    }
    if !msg.has(field) {
        return Ok(0);
    }
    match field.field_type {
        FieldType::Message => {
            let child = msg
                .get_submessage(field)
                .expect("msg.has(field) guarantees a submessage pointer");
            let inner = message_len(&child, options, depth + 1)?;
            Ok(wire::tag_len(field.number) + wire::varint64_len(inner as u64) + inner)
        }
        FieldType::String | FieldType::Bytes => {
            let len = msg.get_string_view(field).as_bytes().len();
            Ok(wire::tag_len(field.number) + wire::varint64_len(len as u64) + len)
        }
        _ => Ok(wire::tag_len(field.number) + scalar_value_len(msg, field)),
    }
}

fn repeated_field_len(
    msg: &Message,
    field: &MiniTableField,
    options: &EncodeOptions,
    depth: u32,
) -> Result<usize, EncodeError> {
    let r = msg.get_repeated(field);
    let count = r.count();
    if count == 0 {
        return Ok(0);
    }
    match field.field_type {
        FieldType::Message => {
            let mut total = 0usize;
            for i in 0..count {
                let child = msg
                    .get_repeated_message(field, i)
                    .expect("repeated MESSAGE elements are always non-null once pushed");
                let inner = message_len(&child, options, depth + 1)?;
                total += wire::tag_len(field.number) + wire::varint64_len(inner as u64) + inner;
            }
            Ok(total)
        }
        FieldType::String | FieldType::Bytes => {
            let mut total = 0usize;
            for i in 0..count {
                let view: crate::message::StringView = r.get(i);
                let len = view.as_bytes().len();
                total += wire::tag_len(field.number) + wire::varint64_len(len as u64) + len;
            }
            Ok(total)
        }
        _ if field.is_packed => {
            let payload: usize = (0..count).map(|i| repeated_scalar_elem_len(r, field, i)).sum();
            Ok(wire::tag_len(field.number) + wire::varint64_len(payload as u64) + payload)
        }
        _ => {
            let per_tag = wire::tag_len(field.number);
            let payload: usize = (0..count)
                .map(|i| per_tag + repeated_scalar_elem_len(r, field, i))
                .sum();
            Ok(payload)
        }
    }
}

fn scalar_value_len(msg: &Message, field: &MiniTableField) -> usize {
    use FieldType::*;
    match field.field_type {
        Double | Fixed64 | Sfixed64 => 8,
        Float | Fixed32 | Sfixed32 => 4,
        Bool => 1,
        Int64 => wire::varint64_len(msg.get_scalar::<i64>(field) as u64),
        Uint64 => wire::varint64_len(msg.get_scalar::<u64>(field)),
        Sint64 => wire::varint64_len(wire::zigzag_encode64(msg.get_scalar::<i64>(field))),
        Int32 => wire::varint64_len(msg.get_scalar::<i32>(field) as i64 as u64),
        Uint32 => wire::varint64_len(msg.get_scalar::<u32>(field) as u64),
        Sint32 => wire::varint64_len(wire::zigzag_encode32(msg.get_scalar::<i32>(field)) as u64),
        Enum => wire::varint64_len(msg.get_scalar::<i32>(field) as i64 as u64),
        String | Bytes | Message | Group => unreachable!("handled by field_len directly"),
    }
}

fn repeated_scalar_elem_len(r: &crate::message::RepeatedField, field: &MiniTableField, index: u32) -> usize {
    use FieldType::*;
    match field.field_type {
        Double | Fixed64 | Sfixed64 => 8,
        Float | Fixed32 | Sfixed32 => 4,
        Bool => 1,
        Int64 => wire::varint64_len(r.get::<i64>(index) as u64),
        Uint64 => wire::varint64_len(r.get::<u64>(index)),
        Sint64 => wire::varint64_len(wire::zigzag_encode64(r.get::<i64>(index))),
        Int32 => wire::varint64_len(r.get::<i32>(index) as i64 as u64),
        Uint32 => wire::varint64_len(r.get::<u32>(index) as u64),
        Sint32 => wire::varint64_len(wire::zigzag_encode32(r.get::<i32>(index)) as u64),
        Enum => wire::varint64_len(r.get::<i32>(index) as i64 as u64),
        String | Bytes | Message | Group => unreachable!("handled by repeated_field_len directly"),
    }
}

fn write_message(
    msg: &Message,
    buf: &mut [u8],
    mut pos: usize,
    options: &EncodeOptions,
    depth: u32,
) -> Result<usize, EncodeError> {
    for field in msg.table.fields {
        pos = write_field(msg, field, buf, pos, options, depth)?;
    }
    Ok(pos)
}

fn write_field(
    msg: &Message,
    field: &MiniTableField,
    buf: &mut [u8],
    mut pos: usize,
    options: &EncodeOptions,
    depth: u32,
) -> Result<usize, EncodeError> {
    if field.mode == FieldMode::Repeated {
        return write_repeated_field(msg, field, buf, pos, options, depth);
    }
    if !msg.has(field) {
        return Ok(pos);
    }
    match field.field_type {
        FieldType::Message => {
            let child = msg.get_submessage(field).expect("checked by has()");
            let inner_len = message_len(&child, options, depth + 1)?;
            pos = wire::write_tag_at(field.number, WireType::Len, buf, pos);
            pos = wire::write_varint64_at(inner_len as u64, buf, pos);
            let end = pos + inner_len;
            let written = write_message(&child, &mut buf[..end], pos, options, depth + 1)?;
            Ok(written)
        }
        FieldType::String | FieldType::Bytes => {
            let bytes = msg.get_string_view(field);
            let bytes = bytes.as_bytes();
            pos = wire::write_tag_at(field.number, WireType::Len, buf, pos);
            pos = wire::write_varint64_at(bytes.len() as u64, buf, pos);
            buf[pos..pos + bytes.len()].copy_from_slice(bytes);
            Ok(pos + bytes.len())
        }
        _ => {
            pos = wire::write_tag_at(field.number, field.field_type.wire_type(), buf, pos);
            Ok(write_scalar_value(msg, field, buf, pos))
        }
    }
}

fn write_repeated_field(
    msg: &Message,
    field: &MiniTableField,
    buf: &mut [u8],
    mut pos: usize,
    options: &EncodeOptions,
    depth: u32,
) -> Result<usize, EncodeError> {
    let r = msg.get_repeated(field);
    let count = r.count();
    if count == 0 {
        return Ok(pos);
    }
    match field.field_type {
        FieldType::Message => {
            for i in 0..count {
                let child = msg
                    .get_repeated_message(field, i)
                    .expect("repeated MESSAGE elements are always non-null once pushed");
                let inner_len = message_len(&child, options, depth + 1)?;
                pos = wire::write_tag_at(field.number, WireType::Len, buf, pos);
                pos = wire::write_varint64_at(inner_len as u64, buf, pos);
                let end = pos + inner_len;
                pos = write_message(&child, &mut buf[..end], pos, options, depth + 1)?;
            }
            Ok(pos)
        }
        FieldType::String | FieldType::Bytes => {
            for i in 0..count {
                let view: crate::message::StringView = r.get(i);
                let bytes = view.as_bytes();
                pos = wire::write_tag_at(field.number, WireType::Len, buf, pos);
                pos = wire::write_varint64_at(bytes.len() as u64, buf, pos);
                buf[pos..pos + bytes.len()].copy_from_slice(bytes);
                pos += bytes.len();
            }
            Ok(pos)
        }
        _ if field.is_packed => {
            let payload: usize = (0..count).map(|i| repeated_scalar_elem_len(r, field, i)).sum();
            pos = wire::write_tag_at(field.number, WireType::Len, buf, pos);
            pos = wire::write_varint64_at(payload as u64, buf, pos);
            for i in 0..count {
                pos = write_scalar_elem(r, field, i, buf, pos);
            }
            Ok(pos)
        }
        _ => {
            for i in 0..count {
                pos = wire::write_tag_at(field.number, field.field_type.wire_type(), buf, pos);
                pos = write_scalar_elem(r, field, i, buf, pos);
            }
            Ok(pos)
        }
    }
}

fn write_scalar_value(msg: &Message, field: &MiniTableField, buf: &mut [u8], pos: usize) -> usize {
    use FieldType::*;
    match field.field_type {
        Double => wire::write_fixed64_at(msg.get_scalar::<f64>(field).to_bits(), buf, pos),
        Fixed64 => wire::write_fixed64_at(msg.get_scalar::<u64>(field), buf, pos),
        Sfixed64 => wire::write_fixed64_at(msg.get_scalar::<i64>(field) as u64, buf, pos),
        Float => wire::write_fixed32_at(msg.get_scalar::<f32>(field).to_bits(), buf, pos),
        Fixed32 => wire::write_fixed32_at(msg.get_scalar::<u32>(field), buf, pos),
        Sfixed32 => wire::write_fixed32_at(msg.get_scalar::<i32>(field) as u32, buf, pos),
        Bool => wire::write_varint64_at(msg.get_bool(field) as u64, buf, pos),
        Int64 => wire::write_varint64_at(msg.get_scalar::<i64>(field) as u64, buf, pos),
        Uint64 => wire::write_varint64_at(msg.get_scalar::<u64>(field), buf, pos),
        Sint64 => wire::write_varint64_at(wire::zigzag_encode64(msg.get_scalar::<i64>(field)), buf, pos),
        Int32 => wire::write_varint64_at(msg.get_scalar::<i32>(field) as i64 as u64, buf, pos),
        Uint32 => wire::write_varint64_at(msg.get_scalar::<u32>(field) as u64, buf, pos),
        Sint32 => wire::write_varint64_at(wire::zigzag_encode32(msg.get_scalar::<i32>(field)) as u64, buf, pos),
        Enum => wire::write_varint64_at(msg.get_scalar::<i32>(field) as i64 as u64, buf, pos),
        String | Bytes | Message | Group => unreachable!("handled by write_field directly"),
    }
}

fn write_scalar_elem(
    r: &crate::message::RepeatedField,
    field: &MiniTableField,
    index: u32,
    buf: &mut [u8],
    pos: usize,
) -> usize {
    use FieldType::*;
    match field.field_type {
        Double => wire::write_fixed64_at(r.get::<f64>(index).to_bits(), buf, pos),
        Fixed64 => wire::write_fixed64_at(r.get::<u64>(index), buf, pos),
        Sfixed64 => wire::write_fixed64_at(r.get::<i64>(index) as u64, buf, pos),
        Float => wire::write_fixed32_at(r.get::<f32>(index).to_bits(), buf, pos),
        Fixed32 => wire::write_fixed32_at(r.get::<u32>(index), buf, pos),
        Sfixed32 => wire::write_fixed32_at(r.get::<i32>(index) as u32, buf, pos),
        Bool => wire::write_varint64_at(r.get::<u8>(index) as u64, buf, pos),
        Int64 => wire::write_varint64_at(r.get::<i64>(index) as u64, buf, pos),
        Uint64 => wire::write_varint64_at(r.get::<u64>(index), buf, pos),
        Sint64 => wire::write_varint64_at(wire::zigzag_encode64(r.get::<i64>(index)), buf, pos),
        Int32 => wire::write_varint64_at(r.get::<i32>(index) as i64 as u64, buf, pos),
        Uint32 => wire::write_varint64_at(r.get::<u32>(index) as u64, buf, pos),
        Sint32 => wire::write_varint64_at(wire::zigzag_encode32(r.get::<i32>(index)) as u64, buf, pos),
        Enum => wire::write_varint64_at(r.get::<i32>(index) as i64 as u64, buf, pos),
        String | Bytes | Message | Group => unreachable!("handled by write_repeated_field directly"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::decode::{decode, DecodeOptions};
    use crate::minitable::{FieldMode, MiniTable};
    use allocator_api2::alloc::Global;

    const FIELDS: &[MiniTableField] = &[
        MiniTableField::new(1, 8, 1, FieldType::Int32, FieldMode::Scalar, false),
        MiniTableField::new(2, 16, 0, FieldType::String, FieldMode::Scalar, false),
        MiniTableField::new(3, 32, 0, FieldType::Int32, FieldMode::Repeated, true),
    ];

    const TABLE: MiniTable = MiniTable {
        fields: FIELDS,
        submessages: &[],
        size: 56,
        hasbit_bytes: 1,
        oneof_count: 0,
        dense_below: 3,
    };

    #[test]
    fn roundtrips_scalar_and_string_and_packed_repeated() {
        let mut build_arena = Arena::new(&Global);
        let mut msg = Message::new(&mut build_arena, &TABLE).unwrap();
        msg.set_scalar(&FIELDS[0], 7i32);
        msg.set_string_view(
            &FIELDS[1],
            crate::message::StringView::from_raw_parts(b"hi".as_ptr(), 2),
        );
        for v in [10i32, 20, 30] {
            msg.repeated_mut(&FIELDS[2]).push(v, &mut build_arena).unwrap();
        }

        let mut out_arena = Arena::new(&Global);
        let bytes = encode(&msg, &mut out_arena, &EncodeOptions::default()).unwrap();

        let mut decode_arena = Arena::new(&Global);
        let decoded = decode(bytes, &TABLE, &mut decode_arena, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.get_scalar::<i32>(&FIELDS[0]), 7);
        assert_eq!(decoded.get_string_view(&FIELDS[1]).as_bytes(), b"hi");
        let r = decoded.get_repeated(&FIELDS[2]);
        assert_eq!(r.count(), 3);
        assert_eq!(r.get::<i32>(0), 10);
        assert_eq!(r.get::<i32>(2), 30);
    }

    #[test]
    fn absent_fields_emit_nothing() {
        let mut build_arena = Arena::new(&Global);
        let msg = Message::new(&mut build_arena, &TABLE).unwrap();
        let mut out_arena = Arena::new(&Global);
        let bytes = encode(&msg, &mut out_arena, &EncodeOptions::default()).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn proto3_implicit_zero_is_not_emitted() {
        let mut build_arena = Arena::new(&Global);
        let mut msg = Message::new(&mut build_arena, &TABLE).unwrap();
        msg.set_scalar(&FIELDS[0], 0i32); // explicit-presence field: zero IS emitted
        let mut out_arena = Arena::new(&Global);
        let bytes = encode(&msg, &mut out_arena, &EncodeOptions::default()).unwrap();
        assert!(!bytes.is_empty());
    }
}
