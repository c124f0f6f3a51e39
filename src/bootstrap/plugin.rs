//! Hand-built MiniTables for a subset of `google/protobuf/compiler/plugin.proto`.
//!
//! A `protoc` code-generator plugin reads a `CodeGeneratorRequest` from
//! stdin and writes a `CodeGeneratorResponse` to stdout; both are ordinary
//! protobuf messages, so a plugin built on this crate needs their tables
//! too. As with `descriptor.rs`, this is hand-assigned layout covering the
//! fields a generator actually consumes/produces.

use super::descriptor::FILE_DESCRIPTOR_PROTO;
use crate::minitable::{FieldMode, FieldType, MiniTable, MiniTableField};

const HEADER: u32 = 8;

static CODE_GENERATOR_REQUEST_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 0, FieldType::String, FieldMode::Repeated, false), // file_to_generate
    MiniTableField::new(2, HEADER + 24, 1, FieldType::String, FieldMode::Scalar, false), // parameter
    MiniTableField::new(15, HEADER + 40, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(0), // proto_file
];

static CODE_GENERATOR_REQUEST_SUBMESSAGES: &[&MiniTable] = &[&FILE_DESCRIPTOR_PROTO];

/// `CodeGeneratorRequest`: `file_to_generate`, `parameter`, `proto_file`.
/// `compiler_version` is not needed by a generator that doesn't gate
/// behavior on the caller's `protoc` version.
pub static CODE_GENERATOR_REQUEST: MiniTable = MiniTable {
    fields: CODE_GENERATOR_REQUEST_FIELDS,
    submessages: CODE_GENERATOR_REQUEST_SUBMESSAGES,
    size: HEADER + 64,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 2,
};

static CODE_GENERATOR_RESPONSE_FILE_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // name
    MiniTableField::new(15, HEADER + 16, 2, FieldType::String, FieldMode::Scalar, false), // content
];

/// `CodeGeneratorResponse.File`: `name`, `content`. `insertion_point` is
/// unneeded without support for plugin-to-plugin insertion points.
pub static CODE_GENERATOR_RESPONSE_FILE: MiniTable = MiniTable {
    fields: CODE_GENERATOR_RESPONSE_FILE_FIELDS,
    submessages: &[],
    size: HEADER + 32,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 1,
};

static CODE_GENERATOR_RESPONSE_FIELDS: &[MiniTableField] = &[
    MiniTableField::new(1, HEADER, 1, FieldType::String, FieldMode::Scalar, false), // error
    MiniTableField::new(15, HEADER + 16, 0, FieldType::Message, FieldMode::Repeated, false)
        .with_submessage(0), // file
];

static CODE_GENERATOR_RESPONSE_SUBMESSAGES: &[&MiniTable] = &[&CODE_GENERATOR_RESPONSE_FILE];

pub static CODE_GENERATOR_RESPONSE: MiniTable = MiniTable {
    fields: CODE_GENERATOR_RESPONSE_FIELDS,
    submessages: CODE_GENERATOR_RESPONSE_SUBMESSAGES,
    size: HEADER + 40,
    hasbit_bytes: 1,
    oneof_count: 0,
    dense_below: 1,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::decode::{decode, DecodeOptions};
    use crate::encode::{encode, EncodeOptions};
    use crate::message::{Message, StringView};
    use allocator_api2::alloc::Global;

    #[test]
    fn request_round_trips_through_the_wire() {
        let mut build_arena = Arena::new(&Global);
        let mut request = Message::new(&mut build_arena, &CODE_GENERATOR_REQUEST).unwrap();
        let field = CODE_GENERATOR_REQUEST.field_by_number(1).unwrap();
        request
            .repeated_mut(field)
            .push(StringView::from_raw_parts(b"foo.proto".as_ptr(), 9), &mut build_arena)
            .unwrap();
        let parameter_field = CODE_GENERATOR_REQUEST.field_by_number(2).unwrap();
        request.set_string_view(parameter_field, StringView::from_raw_parts(b"opt=1".as_ptr(), 5));

        let mut out_arena = Arena::new(&Global);
        let bytes = encode(&request, &mut out_arena, &EncodeOptions::default()).unwrap();

        let mut decode_arena = Arena::new(&Global);
        let decoded = decode(bytes, &CODE_GENERATOR_REQUEST, &mut decode_arena, &DecodeOptions::default()).unwrap();
        assert_eq!(
            decoded.get_repeated(field).get::<StringView>(0).as_bytes(),
            b"foo.proto"
        );
        assert_eq!(decoded.get_string_view(parameter_field).as_bytes(), b"opt=1");
    }
}
