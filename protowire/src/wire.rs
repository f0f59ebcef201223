//! Reading of raw fields from the Protocol Buffers wire format.
//!
//! A [`Reader`] knows nothing about message schemas. It only splits a buffer
//! into `(field number, value)` pairs, keeping track of byte offsets so that
//! errors can point at the offending input.

use core::fmt;

use bytes::{Buf, Bytes};

use crate::error::{located_err, DecodeError, Error};

/// The largest field number permitted by the protobuf language.
pub const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    pub fn from_id(id: u8) -> Result<Self, Error> {
        Ok(match id {
            0 => Self::Varint,
            1 => Self::Fixed64,
            2 => Self::LengthDelimited,
            3 => Self::StartGroup,
            4 => Self::EndGroup,
            5 => Self::Fixed32,
            _ => return Err(Error::InvalidWireType(id)),
        })
    }

    pub fn id(&self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::StartGroup => 3,
            Self::EndGroup => 4,
            Self::Fixed32 => 5,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varint => "varint",
            Self::Fixed64 => "fixed64",
            Self::LengthDelimited => "length-delimited",
            Self::StartGroup => "start-group",
            Self::EndGroup => "end-group",
            Self::Fixed32 => "fixed32",
        };
        write!(f, "{} ({})", name, self.id())
    }
}

/// A single undecoded value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Bytes),
    Fixed32(u32),
}

impl WireValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Varint(_) => WireType::Varint,
            Self::Fixed64(_) => WireType::Fixed64,
            Self::LengthDelimited(_) => WireType::LengthDelimited,
            Self::Fixed32(_) => WireType::Fixed32,
        }
    }
}

/// A field read from the wire. `offset` is the position of the first byte of
/// the value (after the key and, for length-delimited values, after the length
/// prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub number: u32,
    pub value: WireValue,
    pub offset: usize,
}

/// Splits a buffer into fields.
#[derive(Debug, Clone)]
pub struct Reader {
    buf: Bytes,
    offset: usize,
    failed: bool,
}

impl Reader {
    pub fn new<B: Into<Bytes>>(buf: B) -> Self {
        Self::with_offset(buf, 0)
    }

    /// A reader over a sub-slice of a larger input, reporting offsets relative
    /// to the start of the larger input.
    pub fn with_offset<B: Into<Bytes>>(buf: B, offset: usize) -> Self {
        Self {
            buf: buf.into(),
            offset,
            failed: false,
        }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    /// Read the next field, returning `Ok(None)` once the input is exhausted.
    pub fn next_field(&mut self) -> Result<Option<Field>, DecodeError> {
        if self.is_empty() {
            return Ok(None);
        }
        let key_offset = self.offset;
        let key = self.read_varint()?;
        let wire_type =
            WireType::from_id((key & 0x7) as u8).map_err(|e| e.located(key_offset))?;
        let number = key >> 3;
        if number == 0 || number > MAX_FIELD_NUMBER {
            return located_err(key_offset, Error::InvalidFieldNumber(number));
        }
        let value_offset = self.offset;
        let value = match wire_type {
            WireType::Varint => WireValue::Varint(self.read_varint()?),
            WireType::Fixed64 => WireValue::Fixed64(self.read_fixed64()?),
            WireType::Fixed32 => WireValue::Fixed32(self.read_fixed32()?),
            WireType::LengthDelimited => {
                let len = self.read_varint()?;
                WireValue::LengthDelimited(self.read_bytes(len)?)
            }
            WireType::StartGroup | WireType::EndGroup => {
                return located_err(key_offset, Error::UnsupportedWireType(wire_type))
            }
        };
        let offset = match &value {
            WireValue::LengthDelimited(b) => self.offset - b.len(),
            WireValue::Varint(_) | WireValue::Fixed64(_) | WireValue::Fixed32(_) => value_offset,
        };
        Ok(Some(Field {
            number: number as u32,
            value,
            offset,
        }))
    }

    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let start = self.offset;
        let mut result = 0_u64;
        for i in 0..MAX_VARINT_LEN {
            if !self.buf.has_remaining() {
                return located_err(start, Error::UnexpectedEof);
            }
            let b = self.buf.get_u8();
            self.offset += 1;
            result |= ((b & 0x7F) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        located_err(start, Error::VarintTooLong)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        if self.buf.remaining() < 4 {
            return located_err(self.offset, Error::UnexpectedEof);
        }
        self.offset += 4;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        if self.buf.remaining() < 8 {
            return located_err(self.offset, Error::UnexpectedEof);
        }
        self.offset += 8;
        Ok(self.buf.get_u64_le())
    }

    fn read_bytes(&mut self, len: u64) -> Result<Bytes, DecodeError> {
        if len > self.buf.remaining() as u64 {
            return located_err(self.offset, Error::LengthOverflow(len));
        }
        let len = len as usize;
        self.offset += len;
        Ok(self.buf.split_to(len))
    }
}

impl Iterator for Reader {
    type Item = Result<Field, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_field() {
            Ok(maybe_field) => maybe_field.map(Ok),
            Err(e) => {
                // Nothing after a malformed field can be trusted.
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[inline]
pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

#[inline]
pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use crate::Located;

    #[test]
    fn varints() {
        const TEST_CASES: &[(&[u8], u64)] = &[
            (&[0x00], 0),
            (&[0x01], 1),
            (&[0x96, 0x01], 150),
            (&[0xd2, 0x09], 1234),
            (
                &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
                u64::MAX,
            ),
        ];
        for (i, (input, expected)) in TEST_CASES.iter().enumerate() {
            let mut reader = Reader::new(Bytes::from_static(*input));
            assert_eq!(reader.read_varint().unwrap(), *expected, "test case {}", i);
            assert!(reader.is_empty(), "test case {}", i);
        }
    }

    #[test]
    fn overlong_varint() {
        let mut reader = Reader::new(Bytes::from_static(&[0x80; 11]));
        assert_eq!(
            reader.read_varint().unwrap_err(),
            Located::new(0, Error::VarintTooLong)
        );
    }

    #[test]
    fn fields() {
        // field 1 = varint 150, field 2 = "hi", field 3 = fixed32 1
        let mut reader = Reader::new(Bytes::from_static(&[
            0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i', 0x1d, 0x01, 0x00, 0x00, 0x00,
        ]));
        let f1 = reader.next_field().unwrap().unwrap();
        assert_eq!(f1.number, 1);
        assert_eq!(f1.value, WireValue::Varint(150));
        let f2 = reader.next_field().unwrap().unwrap();
        assert_eq!(f2.number, 2);
        assert_eq!(f2.value, WireValue::LengthDelimited(Bytes::from_static(b"hi")));
        assert_eq!(f2.offset, 5);
        let f3 = reader.next_field().unwrap().unwrap();
        assert_eq!(f3.value, WireValue::Fixed32(1));
        assert!(reader.next_field().unwrap().is_none());
    }

    #[test]
    fn truncated_length_delimited() {
        let mut reader = Reader::new(Bytes::from_static(&[0x0a, 0x10, b'a', b'b']));
        assert_eq!(
            reader.next_field().unwrap_err(),
            Located::new(2, Error::LengthOverflow(16))
        );
    }

    #[test]
    fn iteration_stops_after_error() {
        let reader = Reader::new(Bytes::from_static(&[0x08, 0x01, 0x07, 0x08, 0x02]));
        let results = reader.collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1].clone().unwrap_err().err,
            Error::InvalidWireType(7)
        );
    }

    #[test]
    fn zero_field_number() {
        let mut reader = Reader::new(Bytes::from_static(&[0x00, 0x01]));
        assert_eq!(
            reader.next_field().unwrap_err().err,
            Error::InvalidFieldNumber(0)
        );
    }

    #[test]
    fn zigzag() {
        assert_eq!(zigzag_decode32(0), 0);
        assert_eq!(zigzag_decode32(1), -1);
        assert_eq!(zigzag_decode32(2), 1);
        assert_eq!(zigzag_decode32(u32::MAX), i32::MIN);
        assert_eq!(zigzag_decode64(3), -2);
        assert_eq!(zigzag_decode64(u64::MAX - 1), i64::MAX);
    }
}
