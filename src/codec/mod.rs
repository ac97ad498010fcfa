//! Canonical binary codec.
//!
//! # Binary Format
//! - Fixed-width integers: little-endian
//! - `bool`: one byte (0 = false, 1 = true)
//! - Variable-length unsigned integers:
//!   - `< 0xfd`: the value as a single byte
//!   - `<= 0xffff`: `0xfd` followed by a `u16`
//!   - `<= 0xffff_ffff`: `0xfe` followed by a `u32`
//!   - otherwise: `0xff` followed by a `u64`
//! - Byte strings: varint length followed by the bytes
//! - Addresses: the 20 raw bytes, no prefix
//!
//! Encoding never depends on anything except the value being written, so
//! two values with the same fields always produce the same bytes. That is
//! what makes transaction hashes stable.

pub mod sink;
pub mod source;

pub use sink::Sink;
pub use source::Source;

use thiserror::Error;

/// Errors raised while encoding or decoding.
///
/// Every variant names the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The value does not fit the width its encoding allows.
    #[error("{field}: value {value} exceeds encodable maximum {max}")]
    Overflow {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// Input ended before the field was complete.
    #[error("{field}: unexpected end of input (needed {needed} bytes, {remaining} remaining)")]
    UnexpectedEof {
        field: &'static str,
        needed: usize,
        remaining: usize,
    },

    /// The bytes were read but do not form a valid value.
    #[error("{field}: invalid value: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Bytes remained after a complete value was decoded.
    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),
}

/// Types with a canonical binary encoding.
pub trait Encode {
    /// Writes the canonical encoding into `sink`.
    fn encode(&self, sink: &mut Sink) -> Result<(), CodecError>;

    /// Encodes into a fresh buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut sink = Sink::new();
        self.encode(&mut sink)?;
        Ok(sink.into_bytes())
    }
}

/// Types that can be read back from their canonical encoding.
pub trait Decode: Sized {
    /// Reads a value, advancing `source` past it.
    fn decode(source: &mut Source<'_>) -> Result<Self, CodecError>;

    /// Decodes a value that must occupy all of `bytes`.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut source = Source::new(bytes);
        let value = Self::decode(&mut source)?;
        if source.remaining() > 0 {
            return Err(CodecError::TrailingBytes(source.remaining()));
        }
        Ok(value)
    }
}
