//! Errors produced by the wire format decoder.

use core::fmt;
use core::str::Utf8Error;

use crate::WireType;

/// An error tagged with the byte offset in the input at which it occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<E> {
    pub offset: usize,
    pub err: E,
}

impl<E> Located<E> {
    pub fn new(offset: usize, err: E) -> Self {
        Self { offset, err }
    }
}

pub fn located_err<T, E>(offset: usize, err: E) -> Result<T, Located<E>> {
    Err(Located::new(offset, err))
}

/// The error type returned by all decoding operations.
pub type DecodeError = Located<Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnexpectedEof,
    VarintTooLong,
    InvalidWireType(u8),
    UnsupportedWireType(WireType),
    InvalidFieldNumber(u64),
    WireTypeMismatch {
        field: &'static str,
        expected: WireType,
        found: WireType,
    },
    InvalidUtf8(Utf8Error),
    LengthOverflow(u64),
    RecursionLimit,
}

impl Error {
    pub fn located(self, offset: usize) -> Located<Self> {
        Located { offset, err: self }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::VarintTooLong => write!(f, "varint is longer than 10 bytes"),
            Self::InvalidWireType(id) => write!(f, "invalid wire type {}", id),
            Self::UnsupportedWireType(wt) => write!(f, "unsupported wire type {}", wt),
            Self::InvalidFieldNumber(n) => write!(f, "invalid field number {}", n),
            Self::WireTypeMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "field \"{}\" expects wire type {}, but got {}",
                field, expected, found
            ),
            Self::InvalidUtf8(e) => write!(f, "string field is not valid UTF-8: {}", e),
            Self::LengthOverflow(len) => write!(f, "length prefix {} exceeds input", len),
            Self::RecursionLimit => write!(f, "message nesting is too deep"),
        }
    }
}

impl<E: fmt::Display> fmt::Display for Located<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.err, self.offset)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for Located<E> {}
