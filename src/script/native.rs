//! Invocation scripts for native (built-in) contracts.
//!
//! ```text
//! params... PUSH(method) PUSH(contract) PUSH0 SYSCALL PUSH("Ontology.Native.Invoke")
//! ```
//!
//! Parameters are pushed last-first so the contract pops them in order.
//! A struct is built on the alt stack field by field; an array is its
//! elements followed by their count and `PACK`.

use crate::codec::CodecError;
use crate::crypto::Address;
use crate::script::builder::ScriptBuilder;
use crate::script::opcode::OpCode;

/// Interop service the VM dispatches native calls through.
pub const NATIVE_INVOKE_SERVICE: &str = "Ontology.Native.Invoke";

/// Native contract ABI version pushed before the syscall.
pub const NATIVE_INVOKE_VERSION: i128 = 0;

/// A native contract argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeParam {
    Bytes(Vec<u8>),
    Int(i128),
    Bool(bool),
    Struct(Vec<NativeParam>),
    Array(Vec<NativeParam>),
}

impl From<&str> for NativeParam {
    fn from(value: &str) -> Self {
        NativeParam::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for NativeParam {
    fn from(value: Vec<u8>) -> Self {
        NativeParam::Bytes(value)
    }
}

impl From<&Address> for NativeParam {
    fn from(value: &Address) -> Self {
        NativeParam::Bytes(value.as_bytes().to_vec())
    }
}

impl From<u64> for NativeParam {
    fn from(value: u64) -> Self {
        NativeParam::Int(value as i128)
    }
}

impl From<bool> for NativeParam {
    fn from(value: bool) -> Self {
        NativeParam::Bool(value)
    }
}

fn push_param(builder: &mut ScriptBuilder, param: &NativeParam) -> Result<(), CodecError> {
    match param {
        NativeParam::Bytes(bytes) => {
            builder.push_bytes(bytes)?;
        }
        NativeParam::Int(value) => {
            builder.push_int(*value);
        }
        NativeParam::Bool(value) => {
            builder.push_bool(*value);
        }
        NativeParam::Struct(fields) => {
            builder
                .push_int(0)
                .push_opcode(OpCode::NewStruct)
                .push_opcode(OpCode::ToAltStack);
            for field in fields {
                push_param(builder, field)?;
                builder
                    .push_opcode(OpCode::DupFromAltStack)
                    .push_opcode(OpCode::Swap)
                    .push_opcode(OpCode::Append);
            }
            builder.push_opcode(OpCode::FromAltStack);
        }
        NativeParam::Array(items) => {
            push_params(builder, items)?;
            builder.push_int(items.len() as i128).push_opcode(OpCode::Pack);
        }
    }
    Ok(())
}

fn push_params(builder: &mut ScriptBuilder, params: &[NativeParam]) -> Result<(), CodecError> {
    for param in params.iter().rev() {
        push_param(builder, param)?;
    }
    Ok(())
}

/// Script that calls `method` on the native contract at `contract`.
pub fn native_invoke_script(
    method: &str,
    params: &[NativeParam],
    contract: &Address,
) -> Result<Vec<u8>, CodecError> {
    let mut builder = ScriptBuilder::new();
    push_params(&mut builder, params)?;
    builder.push_str(method)?;
    builder.push_bytes(contract.as_bytes())?;
    builder.push_int(NATIVE_INVOKE_VERSION);
    builder.push_opcode(OpCode::Syscall);
    builder.push_str(NATIVE_INVOKE_SERVICE)?;
    Ok(builder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_layout() {
        let script = native_invoke_script(
            "getDDO",
            &[NativeParam::Struct(vec![NativeParam::from("did")])],
            &Address::native(3),
        )
        .unwrap();

        let expected_prefix = [
            0x00, 0xc6, 0x6b, // PUSH0 NEWSTRUCT TOALTSTACK
            0x03, b'd', b'i', b'd', // PUSH("did")
            0x6a, 0x7c, 0xc8, // DUPFROMALTSTACK SWAP APPEND
            0x6c, // FROMALTSTACK
            0x06, b'g', b'e', b't', b'D', b'D', b'O',
            0x14,
        ];
        assert_eq!(&script[..expected_prefix.len()], &expected_prefix);

        let tail = &script[script.len() - 25..];
        assert_eq!(tail[0], 0x00); // version
        assert_eq!(tail[1], 0x68); // SYSCALL
        assert_eq!(tail[2], 22);
        assert_eq!(&tail[3..], NATIVE_INVOKE_SERVICE.as_bytes());
    }

    #[test]
    fn test_params_are_pushed_in_reverse() {
        let script = native_invoke_script(
            "m",
            &[NativeParam::Int(1), NativeParam::Int(2)],
            &Address::native(1),
        )
        .unwrap();
        assert_eq!(&script[..2], &[0x52, 0x51]);
    }

    #[test]
    fn test_array_packs_count() {
        let script = native_invoke_script(
            "transfer",
            &[NativeParam::Array(vec![NativeParam::Bool(true)])],
            &Address::native(1),
        )
        .unwrap();
        assert_eq!(&script[..3], &[0x51, 0x51, 0xc1]);
    }
}
