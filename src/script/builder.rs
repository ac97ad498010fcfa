//! Assembles VM scripts from push operations and opcodes.

use crate::codec::{CodecError, Sink};
use crate::script::opcode::OpCode;

/// Incremental script writer.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    sink: Sink,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { sink: Sink::new() }
    }

    pub fn push_opcode(&mut self, op: OpCode) -> &mut Self {
        self.sink.write_u8(op.into());
        self
    }

    /// Push a byte string with the shortest push form that fits it.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<&mut Self, CodecError> {
        let len = data.len();
        if len <= OpCode::PushBytes75 as usize {
            self.sink.write_u8(len as u8);
        } else if len <= u8::MAX as usize {
            self.sink.write_u8(OpCode::PushData1.into());
            self.sink.write_u8(len as u8);
        } else if len <= u16::MAX as usize {
            self.sink.write_u8(OpCode::PushData2.into());
            self.sink.write_u16(len as u16);
        } else if len <= u32::MAX as usize {
            self.sink.write_u8(OpCode::PushData4.into());
            self.sink.write_u32(len as u32);
        } else {
            return Err(CodecError::Overflow {
                field: "script push data",
                value: len as u64,
                max: u32::MAX as u64,
            });
        }
        self.sink.write_bytes(data);
        Ok(self)
    }

    pub fn push_str(&mut self, value: &str) -> Result<&mut Self, CodecError> {
        self.push_bytes(value.as_bytes())
    }

    /// Push an integer, using the single-byte forms for -1 and 0..=16.
    pub fn push_int(&mut self, value: i128) -> &mut Self {
        match value {
            -1 => self.push_opcode(OpCode::PushM1),
            0 => self.push_opcode(OpCode::Push0),
            1..=16 => {
                self.sink.write_u8(OpCode::Push1 as u8 - 1 + value as u8);
                self
            }
            _ => {
                let bytes = int_to_vm_bytes(value);
                // At most 16 bytes, always a PUSHBYTESn.
                self.sink.write_u8(bytes.len() as u8);
                self.sink.write_bytes(&bytes);
                self
            }
        }
    }

    pub fn push_bool(&mut self, value: bool) -> &mut Self {
        if value {
            self.push_opcode(OpCode::PUSH_TRUE)
        } else {
            self.push_opcode(OpCode::PUSH_FALSE)
        }
    }

    pub fn len(&self) -> usize {
        self.sink.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sink.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.sink.into_bytes()
    }
}

/// Minimal little-endian two's complement encoding, as the VM's big integers use.
pub fn int_to_vm_bytes(value: i128) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let bytes = value.to_le_bytes();
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut len = bytes.len();
    while len > 1 && bytes[len - 1] == fill && (bytes[len - 2] & 0x80) == (fill & 0x80) {
        len -= 1;
    }
    bytes[..len].to_vec()
}

/// Inverse of [`int_to_vm_bytes`]. Inputs longer than 16 bytes are rejected.
pub fn vm_bytes_to_int(bytes: &[u8]) -> Option<i128> {
    if bytes.is_empty() {
        return Some(0);
    }
    if bytes.len() > 16 {
        return None;
    }
    let fill = if bytes[bytes.len() - 1] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buf = [fill; 16];
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(i128::from_le_bytes(buf))
}
