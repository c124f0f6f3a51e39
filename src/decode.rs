//! Recursive-descent decoder: bytes + MiniTable -> Message.
//!
//! The teacher's `decoding.rs` is a resumable, stack-machine parser
//! (`ResumeableParse<STACK_DEPTH>`) built for streaming I/O with suspend
//! points between chunks. There is no streaming entry point here — decode
//! always sees one fully-buffered input — so that machinery doesn't carry
//! over; this is a plain recursive function over `(&[u8], pos, depth)`,
//! closer to the shape of a textbook protobuf parser. What *does* carry over
//! from the teacher is the per-field dispatch table idea (`TableEntry` /
//! `FieldKind`): here it's `MiniTableField::field_type` driving one `match`.

use crate::arena::Arena;
use crate::error::DecodeError;
use crate::message::{Message, StringView};
use crate::minitable::{FieldMode, FieldType, MiniTable, MiniTableField};
use crate::wire::{self, WireType};

/// Tunables for one decode call.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Nested-message depth at which decoding fails with
    /// [`DecodeError::RecursionLimit`] rather than overflow the native stack.
    pub max_depth: u32,
    /// Validate that `string` field bytes are UTF-8. Disabling this trades a
    /// protocol guarantee for speed; only do so when the source is already
    /// trusted.
    pub check_utf8: bool,
    /// When set, `string`/`bytes` fields borrow directly from the input
    /// buffer instead of being copied into the arena. The caller must then
    /// keep the input buffer alive for as long as the decoded message is
    /// used.
    pub alias_string: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: 100,
            check_utf8: true,
            alias_string: false,
        }
    }
}

/// Decodes `buf` into a freshly-allocated message of type `table`.
pub fn decode(
    buf: &[u8],
    table: &'static MiniTable,
    arena: &mut Arena,
    options: &DecodeOptions,
) -> Result<Message, DecodeError> {
    let mut msg = Message::new(arena, table)?;
    decode_into(buf, &mut msg, arena, options, 0)?;
    Ok(msg)
}

/// Merges the fields encoded in `buf` into an already-allocated `msg`
/// (used both by [`decode`] for the top-level message and recursively for
/// submessages, which protobuf always merges rather than replaces).
fn decode_into(
    buf: &[u8],
    msg: &mut Message,
    arena: &mut Arena,
    options: &DecodeOptions,
    depth: u32,
) -> Result<(), DecodeError> {
    if depth > options.max_depth {
        return Err(DecodeError::RecursionLimit { depth });
    }
    let mut pos = 0;
    while pos < buf.len() {
        let (field_number, wire_type, next) = wire::read_tag(buf, pos)?;
        pos = next;
        let field = msg.table.field_by_number(field_number);
        let Some(field) = field else {
            pos = wire::skip_field(buf, pos, wire_type)?;
            continue;
        };
        if !wire_type_is_acceptable(field, wire_type) {
            pos = wire::skip_field(buf, pos, wire_type)?;
            continue;
        }
        pos = decode_field(buf, pos, wire_type, field, msg, arena, options, depth)?;
    }
    Ok(())
}

/// A field accepts its schema's canonical wire type, and additionally
/// accepts the *other* packed/unpacked wire type for packable repeated
/// scalars: a decoder must merge both encodings regardless of the sender's
/// `is_packed` choice (`is_packed` only steers the encoder).
fn wire_type_is_acceptable(field: &MiniTableField, wire_type: WireType) -> bool {
    if wire_type == field.field_type.wire_type() {
        return true;
    }
    field.mode == FieldMode::Repeated && field.field_type.is_packable() && wire_type == WireType::Len
}

#[allow(clippy::too_many_arguments)]
fn decode_field(
    buf: &[u8],
    pos: usize,
    wire_type: WireType,
    field: &'static MiniTableField,
    msg: &mut Message,
    arena: &mut Arena,
    options: &DecodeOptions,
    depth: u32,
) -> Result<usize, DecodeError> {
    if field.mode == FieldMode::Repeated {
        if wire_type == WireType::Len && field.field_type.is_packable() {
            return decode_packed(buf, pos, field, msg, arena);
        }
        return decode_repeated_element(buf, pos, wire_type, field, msg, arena, options, depth);
    }
    decode_scalar(buf, pos, wire_type, field, msg, arena, options, depth)
}

#[allow(clippy::too_many_arguments)]
fn decode_scalar(
    buf: &[u8],
    pos: usize,
    wire_type: WireType,
    field: &'static MiniTableField,
    msg: &mut Message,
    arena: &mut Arena,
    options: &DecodeOptions,
    depth: u32,
) -> Result<usize, DecodeError> {
    use FieldType::*;
    match field.field_type {
        Message => {
            let (slice, next) = wire::read_length_delimited(buf, pos)?;
            let mut child = get_or_create_child(msg, field, arena)?;
            decode_into(slice, &mut child, arena, options, depth + 1)?;
            msg.set_submessage(field, child);
            Ok(next)
        }
        String | Bytes => {
            let (slice, next) = wire::read_length_delimited(buf, pos)?;
            if field.field_type == String && options.check_utf8 {
                core::str::from_utf8(slice)
                    .map_err(|_| DecodeError::BadUtf8 { field_number: field.number, at: pos })?;
            }
            let view = store_bytes(slice, arena, options)?;
            msg.set_string_view(field, view);
            Ok(next)
        }
        _ => {
            let (raw, next) = read_scalar_wire(buf, pos, wire_type)?;
            write_scalar(msg, field, raw);
            Ok(next)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn decode_repeated_element(
    buf: &[u8],
    pos: usize,
    wire_type: WireType,
    field: &'static MiniTableField,
    msg: &mut Message,
    arena: &mut Arena,
    options: &DecodeOptions,
    depth: u32,
) -> Result<usize, DecodeError> {
    use FieldType::*;
    match field.field_type {
        Message => {
            let (slice, next) = wire::read_length_delimited(buf, pos)?;
            let child_table = msg
                .table
                .submessage_for(field)
                .ok_or(DecodeError::InvalidTable { reason: "repeated MESSAGE field has no submessage table" })?;
            let mut child = Message::new(arena, child_table)?;
            decode_into(slice, &mut child, arena, options, depth + 1)?;
            push_message_ptr(msg, field, child, arena)?;
            Ok(next)
        }
        String | Bytes => {
            let (slice, next) = wire::read_length_delimited(buf, pos)?;
            if field.field_type == String && options.check_utf8 {
                core::str::from_utf8(slice)
                    .map_err(|_| DecodeError::BadUtf8 { field_number: field.number, at: pos })?;
            }
            let view = store_bytes(slice, arena, options)?;
            msg.repeated_mut(field).push(view, arena)?;
            Ok(next)
        }
        _ => {
            let (raw, next) = read_scalar_wire(buf, pos, wire_type)?;
            push_scalar(msg, field, raw, arena)?;
            Ok(next)
        }
    }
}

/// Decodes a packed repeated scalar: one length-delimited run of
/// back-to-back wire values with no per-element tag.
fn decode_packed(
    buf: &[u8],
    pos: usize,
    field: &'static MiniTableField,
    msg: &mut Message,
    arena: &mut Arena,
) -> Result<usize, DecodeError> {
    let (slice, next) = wire::read_length_delimited(buf, pos)?;
    let element_wire_type = field.field_type.wire_type();
    let mut i = 0;
    while i < slice.len() {
        let (raw, elem_next) = read_scalar_wire(slice, i, element_wire_type)?;
        push_scalar(msg, field, raw, arena)?;
        i = elem_next;
    }
    Ok(next)
}

/// The bit-pattern-normalized form of any non-message, non-string scalar:
/// read as its wire representation (varint or fixed-width), reinterpreted
/// per the field's declared type (zigzag, truncation to 32 bits, bool, ...).
#[derive(Clone, Copy)]
enum RawScalar {
    U64(u64),
    U32(u32),
}

fn read_scalar_wire(buf: &[u8], pos: usize, wire_type: WireType) -> Result<(RawScalar, usize), DecodeError> {
    match wire_type {
        WireType::Varint => {
            let (v, next) = wire::read_varint64(buf, pos)?;
            Ok((RawScalar::U64(v), next))
        }
        WireType::I64 => {
            let (v, next) = wire::read_fixed64(buf, pos)?;
            Ok((RawScalar::U64(v), next))
        }
        WireType::I32 => {
            let (v, next) = wire::read_fixed32(buf, pos)?;
            Ok((RawScalar::U32(v), next))
        }
        WireType::Len | WireType::SGroup | WireType::EGroup => {
            unreachable!("scalar field dispatch never sees these wire types")
        }
    }
}

fn write_scalar(msg: &mut Message, field: &MiniTableField, raw: RawScalar) {
    use FieldType::*;
    match (field.field_type, raw) {
        (Int64, RawScalar::U64(v)) => msg.set_scalar(field, v as i64),
        (Uint64, RawScalar::U64(v)) => msg.set_scalar(field, v),
        (Sint64, RawScalar::U64(v)) => msg.set_scalar(field, wire::zigzag_decode64(v)),
        (Fixed64, RawScalar::U64(v)) => msg.set_scalar(field, v),
        (Sfixed64, RawScalar::U64(v)) => msg.set_scalar(field, v as i64),
        (Double, RawScalar::U64(v)) => msg.set_scalar(field, f64::from_bits(v)),
        (Int32, RawScalar::U64(v)) => msg.set_scalar(field, v as i32),
        (Uint32, RawScalar::U64(v)) => msg.set_scalar(field, v as u32),
        (Sint32, RawScalar::U64(v)) => msg.set_scalar(field, wire::zigzag_decode32(v as u32)),
        (Bool, RawScalar::U64(v)) => msg.set_bool(field, v != 0),
        (Enum, RawScalar::U64(v)) => msg.set_scalar(field, v as i32),
        (Fixed32, RawScalar::U32(v)) => msg.set_scalar(field, v),
        (Sfixed32, RawScalar::U32(v)) => msg.set_scalar(field, v as i32),
        (Float, RawScalar::U32(v)) => msg.set_scalar(field, f32::from_bits(v)),
        _ => unreachable!("read_scalar_wire's wire type always matches field.field_type.wire_type()"),
    }
}

fn push_scalar(
    msg: &mut Message,
    field: &'static MiniTableField,
    raw: RawScalar,
    arena: &mut Arena,
) -> Result<(), crate::arena::ArenaError> {
    use FieldType::*;
    let r = msg.repeated_mut(field);
    match (field.field_type, raw) {
        (Int64, RawScalar::U64(v)) => r.push(v as i64, arena),
        (Uint64, RawScalar::U64(v)) => r.push(v, arena),
        (Sint64, RawScalar::U64(v)) => r.push(wire::zigzag_decode64(v), arena),
        (Fixed64, RawScalar::U64(v)) => r.push(v, arena),
        (Sfixed64, RawScalar::U64(v)) => r.push(v as i64, arena),
        (Double, RawScalar::U64(v)) => r.push(f64::from_bits(v), arena),
        (Int32, RawScalar::U64(v)) => r.push(v as i32, arena),
        (Uint32, RawScalar::U64(v)) => r.push(v as u32, arena),
        (Sint32, RawScalar::U64(v)) => r.push(wire::zigzag_decode32(v as u32), arena),
        (Bool, RawScalar::U64(v)) => r.push((v != 0) as u8, arena),
        (Enum, RawScalar::U64(v)) => r.push(v as i32, arena),
        (Fixed32, RawScalar::U32(v)) => r.push(v, arena),
        (Sfixed32, RawScalar::U32(v)) => r.push(v as i32, arena),
        (Float, RawScalar::U32(v)) => r.push(f32::from_bits(v), arena),
        _ => unreachable!("read_scalar_wire's wire type always matches field.field_type.wire_type()"),
    }
}

fn store_bytes(slice: &[u8], arena: &mut Arena, options: &DecodeOptions) -> Result<StringView, DecodeError> {
    if options.alias_string {
        return Ok(StringView::from_raw_parts(slice.as_ptr(), slice.len()));
    }
    let ptr = arena.alloc(slice.len().max(1), 1)?;
    // Safety: `ptr` is a fresh allocation of at least `slice.len()` bytes.
    unsafe { core::ptr::copy_nonoverlapping(slice.as_ptr(), ptr.as_ptr(), slice.len()) };
    Ok(StringView::from_raw_parts(ptr.as_ptr(), slice.len()))
}

/// For a scalar `Message` field: reuses the already-merged child if this is
/// a repeat occurrence of the *same* field (including the same active oneof
/// member), otherwise allocates a fresh child. Protobuf merges repeated
/// occurrences of a singular message field into one accumulated value rather
/// than overwriting it.
fn get_or_create_child(
    msg: &mut Message,
    field: &'static MiniTableField,
    arena: &mut Arena,
) -> Result<Message, DecodeError> {
    if let Some(existing) = msg.get_submessage(field) {
        return Ok(existing);
    }
    let child_table = msg
        .table
        .submessage_for(field)
        .ok_or(DecodeError::InvalidTable { reason: "MESSAGE field has no submessage table" })?;
    Ok(Message::new(arena, child_table)?)
}

fn push_message_ptr(
    msg: &mut Message,
    field: &'static MiniTableField,
    child: Message,
    arena: &mut Arena,
) -> Result<(), crate::arena::ArenaError> {
    msg.repeated_mut(field).push(child.raw_ptr(), arena)
}
