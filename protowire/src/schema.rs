//! Runtime descriptions of protobuf message types.
//!
//! Descriptors are plain data and are designed to be declared as `static`s:
//!
//! ```
//! use protowire::{FieldDescriptor, FieldKind, Label, MessageDescriptor};
//!
//! static POINT: MessageDescriptor = MessageDescriptor {
//!     name: "geo.Point",
//!     fields: &[
//!         FieldDescriptor::new(1, "lat", FieldKind::Double, Label::Optional),
//!         FieldDescriptor::new(2, "lon", FieldKind::Double, Label::Optional),
//!     ],
//! };
//!
//! assert_eq!(POINT.field(2).unwrap().name, "lon");
//! ```

use core::fmt;

use crate::WireType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Repeated,
}

/// The declared type of a field.
#[derive(Clone, Copy)]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum(&'static EnumDescriptor),
    Message(&'static MessageDescriptor),
}

impl FieldKind {
    /// The wire type used for a single, unpacked value of this kind.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool
            | Self::Enum(_) => WireType::Varint,
            Self::Double | Self::Fixed64 | Self::Sfixed64 => WireType::Fixed64,
            Self::Float | Self::Fixed32 | Self::Sfixed32 => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    /// Whether repeated fields of this kind may be sent in packed form.
    pub fn is_packable(&self) -> bool {
        !matches!(self, Self::String | Self::Bytes | Self::Message(_))
    }
}

// Message descriptors may refer to themselves, so only names are printed.
impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(e) => write!(f, "Enum({})", e.name),
            Self::Message(m) => write!(f, "Message({})", m.name),
            Self::Double => write!(f, "Double"),
            Self::Float => write!(f, "Float"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Uint32 => write!(f, "Uint32"),
            Self::Uint64 => write!(f, "Uint64"),
            Self::Sint32 => write!(f, "Sint32"),
            Self::Sint64 => write!(f, "Sint64"),
            Self::Fixed32 => write!(f, "Fixed32"),
            Self::Fixed64 => write!(f, "Fixed64"),
            Self::Sfixed32 => write!(f, "Sfixed32"),
            Self::Sfixed64 => write!(f, "Sfixed64"),
            Self::Bool => write!(f, "Bool"),
            Self::String => write!(f, "String"),
            Self::Bytes => write!(f, "Bytes"),
        }
    }
}

#[derive(Debug)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: Label,
}

impl FieldDescriptor {
    pub const fn new(number: u32, name: &'static str, kind: FieldKind, label: Label) -> Self {
        Self {
            number,
            name,
            kind,
            label,
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }
}

#[derive(Debug)]
pub struct EnumDescriptor {
    pub name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumDescriptor {
    /// The symbolic name of the given enum number, if it is known.
    pub fn name_of(&self, number: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, n)| *n == number)
            .map(|(name, _)| *name)
    }
}

#[derive(Debug)]
pub struct MessageDescriptor {
    /// Fully qualified message name, e.g. `tutorial.Person`.
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
