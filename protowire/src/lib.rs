//! Protowire decodes Protocol Buffers messages without generated code. The
//! shape of a message is described by a [`MessageDescriptor`], usually
//! declared as a `static`, and decoding produces a dynamic [`Message`] that
//! can be inspected field by field or printed in protobuf text format.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod error;
pub mod message;
mod prelude;
pub mod schema;
pub mod wire;

pub use error::{DecodeError, Error, Located};
pub use message::{Message, Value};
pub use schema::{EnumDescriptor, FieldDescriptor, FieldKind, Label, MessageDescriptor};
pub use wire::{Field, Reader, WireType, WireValue};
