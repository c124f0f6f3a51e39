//! The MiniTable schema model: a compact, runtime-interpretable description
//! of one message type.
//!
//! A MiniTable drives every field access for its message — there is no
//! per-message generated code in this core (that is the job of the external,
//! out-of-scope code generator; see the crate-level docs). Field layout is
//! purely data: `(offset, FieldType, FieldMode)` tuples the decoder and
//! encoder both read.

use crate::wire::WireType;

/// Sentinel value for [`MiniTableField::submsg_index`] on non-`MESSAGE`
/// fields.
pub const NO_SUBMESSAGE: u16 = u16::MAX;

/// Closed enumeration of protobuf scalar/compound field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    /// `group` encoding. Rejected by the wire reader; retained as an enum
    /// value so a MiniTable can still name the protobuf type for
    /// diagnostics, but no field may carry this as its live type.
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl FieldType {
    /// The wire type this field is encoded with when *not* packed.
    pub const fn wire_type(self) -> WireType {
        use FieldType::*;
        match self {
            Double | Fixed64 | Sfixed64 => WireType::I64,
            Float | Fixed32 | Sfixed32 => WireType::I32,
            Int64 | Uint64 | Int32 | Bool | Enum | Uint32 | Sint32 | Sint64 => WireType::Varint,
            String | Message | Bytes => WireType::Len,
            Group => WireType::SGroup,
        }
    }

    /// Byte width of this type's scalar storage. `String`/`Bytes` store a
    /// `StringView` (16 bytes); `Message` stores a nullable pointer (8
    /// bytes); everything else stores its native scalar width.
    pub const fn storage_size(self) -> usize {
        use FieldType::*;
        match self {
            Double | Int64 | Uint64 | Fixed64 | Sfixed64 | Sint64 => 8,
            Float | Int32 | Fixed32 | Uint32 | Enum | Sfixed32 | Sint32 => 4,
            Bool => 1,
            String | Bytes => core::mem::size_of::<crate::message::StringView>(),
            Message => core::mem::size_of::<usize>(),
            Group => 0,
        }
    }

    pub const fn storage_align(self) -> usize {
        use FieldType::*;
        match self {
            Double | Int64 | Uint64 | Fixed64 | Sfixed64 | Sint64 | Message | String | Bytes => 8,
            Float | Int32 | Fixed32 | Uint32 | Enum | Sfixed32 | Sint32 => 4,
            Bool => 1,
            Group => 1,
        }
    }

    /// Whether this scalar type may appear in a packed repeated field
    /// (everything with a fixed-width or varint wire form; `String`,
    /// `Bytes`, and `Message` never pack).
    pub const fn is_packable(self) -> bool {
        !matches!(self, FieldType::String | FieldType::Bytes | FieldType::Message | FieldType::Group)
    }
}

/// Repetition shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMode {
    Scalar,
    /// A `repeated` field, including a map's synthesized entry submessage
    /// (protobuf's own canonical desugaring of `map<K, V>`: see the
    /// `MiniTable` docs below).
    Repeated,
}

/// Immutable descriptor of one field within a [`MiniTable`].
#[derive(Debug, Clone, Copy)]
pub struct MiniTableField {
    pub number: u32,
    pub offset: u32,
    /// `0`: no explicit presence (proto3 implicit).
    /// `> 0`: 1-based hasbit index (bit `presence - 1` in the hasbit region).
    /// `< 0`: `-(oneof_index + 1)`, the oneof group this field belongs to.
    pub presence: i32,
    /// Index into the parent [`MiniTable::submessages`] when
    /// `field_type == Message`; [`NO_SUBMESSAGE`] otherwise.
    pub submsg_index: u16,
    pub field_type: FieldType,
    pub mode: FieldMode,
    /// Declared packed encoding for `Repeated` scalar fields. Ignored for
    /// `Message`/`String`/`Bytes` elements, which are never packed.
    pub is_packed: bool,
}

impl MiniTableField {
    pub const fn new(
        number: u32,
        offset: u32,
        presence: i32,
        field_type: FieldType,
        mode: FieldMode,
        is_packed: bool,
    ) -> Self {
        MiniTableField {
            number,
            offset,
            presence,
            submsg_index: NO_SUBMESSAGE,
            field_type,
            mode,
            is_packed,
        }
    }

    pub const fn with_submessage(mut self, submsg_index: u16) -> Self {
        self.submsg_index = submsg_index;
        self
    }

    /// `true` if this field belongs to a oneof group (`presence < 0`).
    pub const fn is_oneof_member(&self) -> bool {
        self.presence < 0
    }

    /// The oneof group index this field belongs to (only meaningful when
    /// [`Self::is_oneof_member`] is true).
    pub const fn oneof_index(&self) -> usize {
        debug_assert!(self.presence < 0);
        (-self.presence - 1) as usize
    }

    /// The 0-based hasbit index this field sets (only meaningful when
    /// `presence > 0`).
    pub const fn hasbit_index(&self) -> usize {
        debug_assert!(self.presence > 0);
        (self.presence - 1) as usize
    }
}

/// Compact runtime schema for one message type.
///
/// `fields` MUST be sorted strictly ascending by `number`. The first
/// `dense_below` entries satisfy `fields[i].number == i + 1`, letting
/// [`MiniTable::field_by_number`] index directly instead of
/// binary-searching; the remainder is found via binary search over the
/// sorted tail.
///
/// `submessages` holds one entry per distinct submessage type referenced by
/// a `Message`-typed field, addressed by [`MiniTableField::submsg_index`].
/// Entries may reference the table they belong to (direct self-recursion)
/// or participate in a longer reference cycle (mutual recursion); both are
/// expressed by pointing `submessages[i]` at a `'static` `MiniTable` that
/// itself points back, which in Rust means building the cycle in two steps
/// — declare the tables, then fill in the `submessages` slices once every
/// table in the cycle exists. See `bootstrap/descriptor.rs` for a worked
/// example (`DescriptorProto` contains `DescriptorProto` via
/// `nested_type`).
pub struct MiniTable {
    pub fields: &'static [MiniTableField],
    pub submessages: &'static [&'static MiniTable],
    pub size: u32,
    pub hasbit_bytes: u8,
    pub oneof_count: u8,
    pub dense_below: u8,
}

impl MiniTable {
    /// Byte offset of the start of the oneof-case-tag region (immediately
    /// after the hasbit bitmap).
    pub const fn oneof_region_offset(&self) -> usize {
        self.hasbit_bytes as usize
    }

    /// Byte offset of oneof group `index`'s 32-bit case tag.
    pub const fn oneof_case_offset(&self, index: usize) -> usize {
        self.oneof_region_offset() + index * 4
    }

    /// Looks up the field descriptor for `number`, in O(1) for the dense
    /// prefix and O(log F) otherwise.
    pub fn field_by_number(&self, number: u32) -> Option<&'static MiniTableField> {
        let dense_below = self.dense_below as u32;
        if number >= 1 && number <= dense_below {
            let field = &self.fields[(number - 1) as usize];
            debug_assert_eq!(field.number, number);
            return Some(field);
        }
        self.fields[self.dense_below as usize..]
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|i| &self.fields[self.dense_below as usize + i])
    }

    /// The submessage table a `Message`-typed field points at.
    pub fn submessage_for(&self, field: &MiniTableField) -> Option<&'static MiniTable> {
        if field.field_type != FieldType::Message {
            return None;
        }
        self.submessages.get(field.submsg_index as usize).copied()
    }
}
