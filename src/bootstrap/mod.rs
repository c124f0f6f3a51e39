//! Hand-coded MiniTables for `descriptor.proto` and `plugin.proto`.
//!
//! The descriptor-to-MiniTable code generator is out of scope for this
//! core (see the crate-level docs): there is no `.proto` compiler here to
//! produce these tables from source. But the tables for `descriptor.proto`
//! and `plugin.proto` themselves have to come from *somewhere* — a code
//! generator for protobuf schemas is itself fed a `FileDescriptorProto`,
//! and a `protoc` plugin built on this crate is fed a `CodeGeneratorRequest`
//! — so both are bootstrapped by hand here, the same way `upb` and other
//! from-scratch protobuf runtimes hand-write their own bootstrap tables for
//! the one or two messages needed to get the rest of the system running.
//!
//! Coverage is intentionally partial: enough fields on each message to
//! parse and build the shapes a code generator actually needs (message and
//! field names, numbers, types, nesting), not a full mirror of
//! `descriptor.proto`.

pub mod descriptor;
pub mod plugin;
