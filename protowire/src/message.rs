//! Dynamic messages decoded against a [`MessageDescriptor`].

use core::fmt::{self, Write};

use bytes::Bytes;

use crate::error::{located_err, DecodeError, Error};
use crate::prelude::*;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};
use crate::wire::{zigzag_decode32, zigzag_decode64, Field, Reader, WireType, WireValue};

/// The maximum number of message levels decoded, counting the outermost
/// message. Anything nested deeper is rejected.
pub const RECURSION_LIMIT: usize = 64;

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    Enum(i32),
    Message(Message),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I32(i) | Self::Enum(i) => Some(*i as i64),
            Self::I64(i) => Some(*i),
            Self::U32(u) => Some(*u as i64),
            Self::U64(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    // Singular scalars holding their default value are not considered present
    // (proto3 implicit presence).
    fn is_default(&self) -> bool {
        match self {
            Self::Bool(b) => !*b,
            Self::I32(i) | Self::Enum(i) => *i == 0,
            Self::I64(i) => *i == 0,
            Self::U32(u) => *u == 0,
            Self::U64(u) => *u == 0,
            Self::F32(f) => f.to_bits() == 0,
            Self::F64(f) => f.to_bits() == 0,
            Self::String(s) => s.is_empty(),
            Self::Bytes(b) => b.is_empty(),
            Self::Message(_) => false,
        }
    }
}

/// A message whose fields are held as dynamic [`Value`]s.
#[derive(Debug, Clone)]
pub struct Message {
    descriptor: &'static MessageDescriptor,
    // Keyed by field number, so iteration follows field number order.
    fields: BTreeMap<u32, Vec<Value>>,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.fields == other.fields
    }
}

impl Message {
    /// An empty message of the given type.
    pub fn new(descriptor: &'static MessageDescriptor) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    /// Decode a serialized message. Unknown fields are skipped; a known field
    /// carrying the wrong wire type is an error.
    pub fn decode<B: Into<Bytes>>(
        descriptor: &'static MessageDescriptor,
        buf: B,
    ) -> Result<Self, DecodeError> {
        Self::decode_nested(descriptor, Reader::new(buf), 0)
    }

    fn decode_nested(
        descriptor: &'static MessageDescriptor,
        reader: Reader,
        depth: usize,
    ) -> Result<Self, DecodeError> {
        if depth >= RECURSION_LIMIT {
            return located_err(reader.offset(), Error::RecursionLimit);
        }
        let mut msg = Self::new(descriptor);
        for field_result in reader {
            let field = field_result?;
            let fd = match descriptor.field(field.number) {
                Some(fd) => fd,
                None => continue,
            };
            msg.merge_field(fd, field, depth)?;
        }
        Ok(msg)
    }

    fn merge_field(
        &mut self,
        fd: &'static FieldDescriptor,
        field: Field,
        depth: usize,
    ) -> Result<(), DecodeError> {
        let expected = fd.kind.wire_type();
        let found = field.value.wire_type();
        let values = if found == expected {
            vec![decode_value(fd, field.value, field.offset, depth)?]
        } else if fd.is_repeated() && fd.kind.is_packable() && found == WireType::LengthDelimited
        {
            decode_packed(fd, field.value, field.offset)?
        } else {
            return located_err(
                field.offset,
                Error::WireTypeMismatch {
                    field: fd.name,
                    expected,
                    found,
                },
            );
        };
        let slot = self.fields.entry(fd.number).or_default();
        if fd.is_repeated() {
            slot.extend(values);
        } else {
            // Last one wins for singular fields.
            *slot = values;
        }
        Ok(())
    }

    pub fn descriptor(&self) -> &'static MessageDescriptor {
        self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.name
    }

    /// The value of a singular field, if present on the wire.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let fd = self.descriptor.field_by_name(name)?;
        self.fields.get(&fd.number).and_then(|v| v.last())
    }

    /// All values of a repeated field (empty if absent).
    pub fn get_repeated(&self, name: &str) -> &[Value] {
        self.descriptor
            .field_by_name(name)
            .and_then(|fd| self.fields.get(&fd.number))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for (number, values) in self.fields.iter() {
            let fd = match self.descriptor.field(*number) {
                Some(fd) => fd,
                None => continue,
            };
            for value in values {
                if !fd.is_repeated() && value.is_default() {
                    continue;
                }
                write_indent(f, indent)?;
                match value {
                    Value::Message(m) => {
                        writeln!(f, "{} {{", fd.name)?;
                        m.write_text(f, indent + 2)?;
                        write_indent(f, indent)?;
                        writeln!(f, "}}")?;
                    }
                    _ => {
                        write!(f, "{}: ", fd.name)?;
                        write_scalar(f, fd, value)?;
                        writeln!(f)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Formats the message in protobuf text format.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_text(f, 0)
    }
}

fn decode_value(
    fd: &'static FieldDescriptor,
    value: WireValue,
    offset: usize,
    depth: usize,
) -> Result<Value, DecodeError> {
    Ok(match (fd.kind, value) {
        (FieldKind::Int32, WireValue::Varint(v)) => Value::I32(v as i32),
        (FieldKind::Int64, WireValue::Varint(v)) => Value::I64(v as i64),
        (FieldKind::Uint32, WireValue::Varint(v)) => Value::U32(v as u32),
        (FieldKind::Uint64, WireValue::Varint(v)) => Value::U64(v),
        (FieldKind::Sint32, WireValue::Varint(v)) => Value::I32(zigzag_decode32(v as u32)),
        (FieldKind::Sint64, WireValue::Varint(v)) => Value::I64(zigzag_decode64(v)),
        (FieldKind::Bool, WireValue::Varint(v)) => Value::Bool(v != 0),
        (FieldKind::Enum(_), WireValue::Varint(v)) => Value::Enum(v as i32),
        (FieldKind::Fixed32, WireValue::Fixed32(v)) => Value::U32(v),
        (FieldKind::Sfixed32, WireValue::Fixed32(v)) => Value::I32(v as i32),
        (FieldKind::Float, WireValue::Fixed32(v)) => Value::F32(f32::from_bits(v)),
        (FieldKind::Fixed64, WireValue::Fixed64(v)) => Value::U64(v),
        (FieldKind::Sfixed64, WireValue::Fixed64(v)) => Value::I64(v as i64),
        (FieldKind::Double, WireValue::Fixed64(v)) => Value::F64(f64::from_bits(v)),
        (FieldKind::String, WireValue::LengthDelimited(b)) => {
            let s = core::str::from_utf8(&b).map_err(|e| Error::InvalidUtf8(e).located(offset))?;
            Value::String(String::from(s))
        }
        (FieldKind::Bytes, WireValue::LengthDelimited(b)) => Value::Bytes(b),
        (FieldKind::Message(desc), WireValue::LengthDelimited(b)) => Value::Message(
            Message::decode_nested(desc, Reader::with_offset(b, offset), depth + 1)?,
        ),
        (_, value) => {
            return located_err(
                offset,
                Error::WireTypeMismatch {
                    field: fd.name,
                    expected: fd.kind.wire_type(),
                    found: value.wire_type(),
                },
            )
        }
    })
}

fn decode_packed(
    fd: &'static FieldDescriptor,
    value: WireValue,
    offset: usize,
) -> Result<Vec<Value>, DecodeError> {
    let buf = match value {
        WireValue::LengthDelimited(b) => b,
        other => {
            return located_err(
                offset,
                Error::WireTypeMismatch {
                    field: fd.name,
                    expected: WireType::LengthDelimited,
                    found: other.wire_type(),
                },
            )
        }
    };
    let mut reader = Reader::with_offset(buf, offset);
    let mut values = Vec::new();
    while !reader.is_empty() {
        let item_offset = reader.offset();
        let raw = match fd.kind.wire_type() {
            WireType::Fixed32 => WireValue::Fixed32(reader.read_fixed32()?),
            WireType::Fixed64 => WireValue::Fixed64(reader.read_fixed64()?),
            _ => WireValue::Varint(reader.read_varint()?),
        };
        values.push(decode_value(fd, raw, item_offset, 0)?);
    }
    Ok(values)
}

fn write_indent(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_char(' ')?;
    }
    Ok(())
}

fn write_scalar(f: &mut fmt::Formatter<'_>, fd: &FieldDescriptor, value: &Value) -> fmt::Result {
    match value {
        Value::Bool(b) => write!(f, "{}", b),
        Value::I32(i) => write!(f, "{}", i),
        Value::I64(i) => write!(f, "{}", i),
        Value::U32(u) => write!(f, "{}", u),
        Value::U64(u) => write!(f, "{}", u),
        Value::F32(v) => write!(f, "{:?}", v),
        Value::F64(v) => write!(f, "{:?}", v),
        Value::String(s) => write_escaped(f, s.as_bytes()),
        Value::Bytes(b) => write_escaped(f, b),
        Value::Enum(n) => match fd.kind {
            FieldKind::Enum(ed) => match ed.name_of(*n) {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", n),
            },
            _ => write!(f, "{}", n),
        },
        Value::Message(m) => write!(f, "{{ {} }}", m.type_name()),
    }
}

// C-style escaping as produced by the reference text format printer: printable
// ASCII is kept, everything else becomes a three-digit octal escape.
fn write_escaped(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_char('"')?;
    for b in bytes {
        match b {
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\t' => f.write_str("\\t")?,
            b'"' => f.write_str("\\\"")?,
            b'\'' => f.write_str("\\'")?,
            b'\\' => f.write_str("\\\\")?,
            0x20..=0x7e => f.write_char(*b as char)?,
            _ => write!(f, "\\{:03o}", b)?,
        }
    }
    f.write_char('"')
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::{EnumDescriptor, Label};
    use alloc::string::ToString;
    use lazy_static::lazy_static;

    static KIND: EnumDescriptor = EnumDescriptor {
        name: "test.Kind",
        values: &[("NONE", 0), ("LEAF", 1), ("BRANCH", 2)],
    };

    static ITEM: MessageDescriptor = MessageDescriptor {
        name: "test.Item",
        fields: &[
            FieldDescriptor::new(1, "label", FieldKind::String, Label::Optional),
            FieldDescriptor::new(2, "delta", FieldKind::Sint32, Label::Optional),
            FieldDescriptor::new(3, "kind", FieldKind::Enum(&KIND), Label::Optional),
            FieldDescriptor::new(4, "weights", FieldKind::Int32, Label::Repeated),
            FieldDescriptor::new(5, "ratio", FieldKind::Double, Label::Optional),
            FieldDescriptor::new(6, "children", FieldKind::Message(&ITEM), Label::Repeated),
        ],
    };

    lazy_static! {
        // label "a\"b", delta -2, kind BRANCH, packed weights [1, 150], an
        // unknown field 9, and a nested child with label "c"
        static ref ITEM_BYTES: Vec<u8> = vec![
            0x0a, 0x03, b'a', b'"', b'b',
            0x10, 0x03,
            0x18, 0x02,
            0x22, 0x03, 0x01, 0x96, 0x01,
            0x48, 0x07,
            0x32, 0x03, 0x0a, 0x01, b'c',
        ];

        static ref MALFORMED: Vec<(Vec<u8>, Error)> = vec![
            (vec![0x0a, 0x05, b'a'], Error::LengthOverflow(5)),
            (
                vec![0x08, 0x01],
                Error::WireTypeMismatch {
                    field: "label",
                    expected: WireType::LengthDelimited,
                    found: WireType::Varint,
                },
            ),
            (vec![0x0a, 0x01, 0xff], Error::InvalidUtf8(
                core::str::from_utf8(&[0xff]).unwrap_err(),
            )),
            (vec![0x0b], Error::UnsupportedWireType(WireType::StartGroup)),
        ];
    }

    #[test]
    fn decode_item() {
        let msg = Message::decode(&ITEM, ITEM_BYTES.clone()).unwrap();
        assert_eq!(msg.type_name(), "test.Item");
        assert_eq!(msg.get("label").unwrap().as_str(), Some("a\"b"));
        assert_eq!(msg.get("delta").unwrap().as_i64(), Some(-2));
        assert_eq!(msg.get("kind"), Some(&Value::Enum(2)));
        assert_eq!(
            msg.get_repeated("weights"),
            &[Value::I32(1), Value::I32(150)]
        );
        assert!(msg.get("ratio").is_none());
        let children = msg.get_repeated("children");
        assert_eq!(children.len(), 1);
        assert_eq!(
            children[0].as_message().unwrap().get("label").unwrap().as_str(),
            Some("c")
        );
    }

    #[test]
    fn text_format() {
        let msg = Message::decode(&ITEM, ITEM_BYTES.clone()).unwrap();
        assert_eq!(
            msg.to_string(),
            "label: \"a\\\"b\"\n\
             delta: -2\n\
             kind: BRANCH\n\
             weights: 1\n\
             weights: 150\n\
             children {\n  label: \"c\"\n}\n"
        );
    }

    #[test]
    fn defaults_are_not_printed() {
        // kind NONE and an empty label
        let msg = Message::decode(&ITEM, vec![0x18, 0x00, 0x0a, 0x00]).unwrap();
        assert!(!msg.is_empty());
        assert_eq!(msg.to_string(), "");
    }

    #[test]
    fn malformed() {
        for (i, (input, expected)) in MALFORMED.iter().enumerate() {
            let err = Message::decode(&ITEM, input.clone()).unwrap_err();
            assert_eq!(err.err, *expected, "test case {}", i);
        }
    }

    fn encode_varint(mut n: usize, out: &mut Vec<u8>) {
        while n >= 0x80 {
            out.push((n as u8 & 0x7f) | 0x80);
            n >>= 7;
        }
        out.push(n as u8);
    }

    /// A message holding `levels` levels of children below it.
    fn nested_children(levels: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        for _ in 0..levels {
            let mut outer = vec![0x32];
            encode_varint(buf.len(), &mut outer);
            outer.extend(buf);
            buf = outer;
        }
        buf
    }

    #[test]
    fn recursion_limit() {
        const TEST_CASES: &[(usize, bool)] = &[
            (1, true),
            (RECURSION_LIMIT - 1, true),
            (RECURSION_LIMIT, false),
            (RECURSION_LIMIT + 1, false),
        ];
        for (children, ok) in TEST_CASES {
            let result = Message::decode(&ITEM, nested_children(*children));
            match (result, *ok) {
                (Ok(_), true) => {}
                (Err(e), false) => assert_eq!(e.err, Error::RecursionLimit, "{}", children),
                (other, _) => panic!("{} levels of children: {:?}", children, other),
            }
        }
    }

    #[test]
    fn non_ascii_strings_are_octal_escaped() {
        let mut input = vec![0x0a, 0x02];
        input.extend("é".as_bytes());
        let msg = Message::decode(&ITEM, input).unwrap();
        assert_eq!(msg.to_string(), "label: \"\\303\\251\"\n");
    }
}
