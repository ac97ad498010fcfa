//! Cursor over encoded bytes.

use super::CodecError;

/// Reads canonical fields from a byte slice, advancing past each one.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    input: &'a [u8],
}

impl<'a> Source<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Reads exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        if self.input.len() < n {
            return Err(CodecError::UnexpectedEof {
                field,
                needed: n,
                remaining: self.input.len(),
            });
        }
        let (bytes, rest) = self.input.split_at(n);
        self.input = rest;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        Ok(self.read_bytes(1, field)?[0])
    }

    pub fn read_bool(&mut self, field: &'static str) -> Result<bool, CodecError> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidValue {
                field,
                reason: format!("expected 0 or 1, got {}", other),
            }),
        }
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    /// Reads a varint, rejecting non-shortest encodings.
    pub fn read_var_uint(&mut self, field: &'static str) -> Result<u64, CodecError> {
        let (value, min) = match self.read_u8(field)? {
            0xfd => (self.read_u16(field)? as u64, 0xfd),
            0xfe => (self.read_u32(field)? as u64, 0x1_0000),
            0xff => (self.read_u64(field)?, 0x1_0000_0000),
            small => return Ok(small as u64),
        };
        if value < min {
            return Err(CodecError::InvalidValue {
                field,
                reason: format!("non-canonical varint encoding of {}", value),
            });
        }
        Ok(value)
    }

    pub fn read_var_bytes(&mut self, field: &'static str) -> Result<Vec<u8>, CodecError> {
        let len = self.read_var_uint(field)?;
        let len = usize::try_from(len).map_err(|_| CodecError::Overflow {
            field,
            value: len,
            max: usize::MAX as u64,
        })?;
        Ok(self.read_bytes(len, field)?.to_vec())
    }

    pub fn read_var_str(&mut self, field: &'static str) -> Result<String, CodecError> {
        let bytes = self.read_var_bytes(field)?;
        String::from_utf8(bytes).map_err(|e| CodecError::InvalidValue {
            field,
            reason: e.to_string(),
        })
    }
}
