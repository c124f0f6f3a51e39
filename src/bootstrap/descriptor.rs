//! Hand-built MiniTables for a subset of `google/protobuf/descriptor.proto`.
//!
//! `DescriptorProto` contains `DescriptorProto` (`nested_type`), so building
//! its table is the worked example for the two-step construction the
//! `MiniTable` docs describe: the table's `submessages` slice has to name
//! the table before the table's own `static` item finishes being declared.
//! Rust's `static` items resolve by address, not value, so a slice of
//! `&'static MiniTable` can point back at the very table it's attached to —
//! no `OnceLock`/lazy-init cell is needed, just ordinary forward reference
//! between `static`s.
//!
//! Field layout here is hand-assigned rather than computed: an 8-byte
//! header reserves room for the hasbit byte (no message in this bootstrap
//! set has more than 8 explicit-presence scalar fields, or any oneofs), and
//! each field is placed after it at its own natural alignment. A real
//! layout pass (part of the out-of-scope code generator) would pack this
//! tighter; it doesn't matter for correctness since every field access goes
//! through an unaligned read/write regardless of where the field sits.

use crate::minitable::{FieldMode, FieldType, MiniTable, MiniTableField};

const HEADER: u32 = 8;

static FIELD_DESCRIPTOR_PROTO_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(3, HEADER + 16, 2, FieldType::Int32, FieldMode::Scalar, false), // number
    MiniTableField::new(5, HEADER + 20, 3, FieldType::Enum, FieldMode::Scalar, false), // type
    MiniTableField::new(6, HEADER + 24, 4, FieldType::String, FieldMode::Scalar, false), // type_name
];

/// `FieldDescriptorProto`: `name`, `number`, `type`, `type_name`. `label` and
/// the `*_options`/default-value fields are not needed to describe a
/// message's shape and are left out.
pub static FIELD_DESCRIPTOR_PROTO: MiniTable = MiniTable {
    fields: FIELD_DESCRIPTOR_PROTO_FIELDS,
    submessages: &[],
    size: HEADER + 40,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 1,
};

static ENUM_VALUE_DESCRIPTOR_PROTO_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(2, HEADER + 16, 2, FieldType::Int32, FieldMode::Scalar, false), // number
];

pub static ENUM_VALUE_DESCRIPTOR_PROTO: MiniTable = MiniTable {
    fields: ENUM_VALUE_DESCRIPTOR_PROTO_FIELDS,
    submessages: &[],
    size: HEADER + 20,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 2,
};

static ENUM_DESCRIPTOR_PROTO_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(2, HEADER + 16, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(0), // value
];

static ENUM_DESCRIPTOR_PROTO_SUBMESSAGES: &[&MiniTable] = &[&ENUM_VALUE_DESCRIPTOR_PROTO];

pub static ENUM_DESCRIPTOR_PROTO: MiniTable = MiniTable {
    fields: ENUM_DESCRIPTOR_PROTO_FIELDS,
    submessages: ENUM_DESCRIPTOR_PROTO_SUBMESSAGES,
    size: HEADER + 40,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 2,
};

static DESCRIPTOR_PROTO_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(2, HEADER + 16, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(0), // field
    MiniTableField::new(3, HEADER + 40, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(1), // nested_type: DescriptorProto, recursively
    MiniTableField::new(4, HEADER + 64, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(2), // enum_type
];

// Step two of the two-step construction: this slice names `DESCRIPTOR_PROTO`
// itself (for `nested_type`) before that `static` finishes declaring. Valid
// because `&'static MiniTable` only needs `DESCRIPTOR_PROTO`'s eventual
// address, which the compiler already knows at this point.
static DESCRIPTOR_PROTO_SUBMESSAGES: &[&MiniTable] =
    &[&FIELD_DESCRIPTOR_PROTO, &DESCRIPTOR_PROTO, &ENUM_DESCRIPTOR_PROTO];

pub static DESCRIPTOR_PROTO: MiniTable = MiniTable {
    fields: DESCRIPTOR_PROTO_FIELDS,
    submessages: DESCRIPTOR_PROTO_SUBMESSAGES,
    size: HEADER + 88,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 4,
};

static FILE_DESCRIPTOR_PROTO_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(2, HEADER + 16, 2, FieldType::String, FieldMode::Scalar, false), // package
    MiniTableField::new(4, HEADER + 32, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(0), // message_type
    MiniTableField::new(5, HEADER + 56, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(1), // enum_type
];

static FILE_DESCRIPTOR_PROTO_SUBMESSAGES: &[&MiniTable] = &[&DESCRIPTOR_PROTO, &ENUM_DESCRIPTOR_PROTO];

/// `FileDescriptorProto`: `name`, `package`, `message_type`, `enum_type`.
/// `dependency`, `service`, `extension`, and the various `*_options` fields
/// are out of scope for a minimal code-generator input.
pub static FILE_DESCRIPTOR_PROTO: MiniTable = MiniTable {
    fields: FILE_DESCRIPTOR_PROTO_FIELDS,
    submessages: FILE_DESCRIPTOR_PROTO_SUBMESSAGES,
    size: HEADER + 80,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 2,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_proto_nested_type_points_back_at_itself() {
        let nested_type_field = DESCRIPTOR_PROTO.field_by_number(3).unwrap();
        let table = DESCRIPTOR_PROTO.submessage_for(nested_type_field).unwrap();
        assert!(core::ptr::eq(table, &DESCRIPTOR_PROTO));
    }

    #[test]
    fn every_field_is_reachable_by_number() {
        for table in [
            &FIELD_DESCRIPTOR_PROTO,
            &ENUM_VALUE_DESCRIPTOR_PROTO,
            &ENUM_DESCRIPTOR_PROTO,
            &DESCRIPTOR_PROTO,
            &FILE_DESCRIPTOR_PROTO,
        ] {
            for field in table.fields {
                assert!(table.field_by_number(field.number).is_some());
            }
        }
    }
}
