//! Verification and invocation programs attached to signatures.
//!
//! A verification program names who may sign; the invocation program
//! carries the signatures themselves.
//!
//! ```text
//! single key:  PUSH(pubkey) CHECKSIG
//! m-of-n:      PUSH(m) PUSH(pk_1) .. PUSH(pk_n) PUSH(n) CHECKMULTISIG   (keys sorted)
//! invocation:  PUSH(sig_1) .. PUSH(sig_k)
//! ```

use crate::codec::{CodecError, Source};
use crate::crypto::{PublicKey, Signature, SigningError};
use crate::error::Result;
use crate::script::builder::{vm_bytes_to_int, ScriptBuilder};
use crate::script::opcode::OpCode;

/// Largest key set the network accepts in a multi-signature program.
pub const MULTI_SIG_MAX_KEYS: usize = 16;

/// Who may sign, as decoded from a verification program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub m: u16,
    pub public_keys: Vec<PublicKey>,
}

/// `PUSH(pubkey) CHECKSIG`.
pub fn single_key_program(public_key: &PublicKey) -> Result<Vec<u8>> {
    let mut builder = ScriptBuilder::new();
    builder.push_bytes(&public_key.to_bytes())?;
    builder.push_opcode(OpCode::CheckSig);
    Ok(builder.into_bytes())
}

/// m-of-n program over the keys in canonical order.
pub fn multi_sig_program(m: u16, public_keys: &[PublicKey]) -> Result<Vec<u8>> {
    let n = public_keys.len();
    if m == 0 || (m as usize) > n || n > MULTI_SIG_MAX_KEYS {
        return Err(SigningError::InvalidMultiSig(format!(
            "need 1 <= m <= n <= {}, got m={} n={}",
            MULTI_SIG_MAX_KEYS, m, n
        ))
        .into());
    }
    let mut sorted = public_keys.to_vec();
    sorted.sort();

    let mut builder = ScriptBuilder::new();
    builder.push_int(m as i128);
    for key in &sorted {
        builder.push_bytes(&key.to_bytes())?;
    }
    builder.push_int(n as i128);
    builder.push_opcode(OpCode::CheckMultiSig);
    Ok(builder.into_bytes())
}

/// Program for `info`: single-key form when there is one key, m-of-n otherwise.
pub fn verification_program(info: &ProgramInfo) -> Result<Vec<u8>> {
    match info.public_keys.as_slice() {
        [only] if info.m == 1 => single_key_program(only),
        keys => multi_sig_program(info.m, keys),
    }
}

pub fn invocation_program(signatures: &[Signature]) -> Result<Vec<u8>> {
    let mut builder = ScriptBuilder::new();
    for sig in signatures {
        builder.push_bytes(&sig.to_bytes())?;
    }
    Ok(builder.into_bytes())
}

/// Reads push operations back out of a script.
struct ProgramReader<'a> {
    source: Source<'a>,
}

impl<'a> ProgramReader<'a> {
    fn new(script: &'a [u8]) -> Self {
        Self {
            source: Source::new(script),
        }
    }

    fn is_done(&self) -> bool {
        self.source.remaining() == 0
    }

    fn read_opcode(&mut self) -> std::result::Result<u8, CodecError> {
        self.source.read_u8("program opcode")
    }

    fn read_push_with(&mut self, op: u8) -> std::result::Result<Vec<u8>, CodecError> {
        const FIELD: &str = "program push data";
        let len = match op {
            0x00 => 0,
            n if n <= OpCode::PushBytes75 as u8 => n as usize,
            0x4c => self.source.read_u8(FIELD)? as usize,
            0x4d => self.source.read_u16(FIELD)? as usize,
            0x4e => self.source.read_u32(FIELD)? as usize,
            other => {
                return Err(CodecError::InvalidValue {
                    field: FIELD,
                    reason: format!("expected a push opcode, got 0x{:02x}", other),
                })
            }
        };
        Ok(self.source.read_bytes(len, FIELD)?.to_vec())
    }

    fn read_push(&mut self) -> std::result::Result<Vec<u8>, CodecError> {
        let op = self.read_opcode()?;
        self.read_push_with(op)
    }

    /// Reads one push, keeping the single-byte integer opcodes distinct
    /// from byte pushes.
    fn read_item(&mut self) -> std::result::Result<PushItem, CodecError> {
        let op = self.read_opcode()?;
        match op {
            0x4f => Ok(PushItem::Int(-1)),
            n if (OpCode::Push1 as u8..=OpCode::Push16 as u8).contains(&n) => {
                Ok(PushItem::Int((n - OpCode::Push1 as u8 + 1) as i128))
            }
            _ => Ok(PushItem::Bytes(self.read_push_with(op)?)),
        }
    }
}

enum PushItem {
    Int(i128),
    Bytes(Vec<u8>),
}

impl PushItem {
    fn as_int(&self) -> std::result::Result<i128, CodecError> {
        match self {
            PushItem::Int(v) => Ok(*v),
            PushItem::Bytes(bytes) => vm_bytes_to_int(bytes).ok_or_else(|| CodecError::InvalidValue {
                field: "program integer",
                reason: format!("{} bytes is too wide", bytes.len()),
            }),
        }
    }
}

/// Decode the signer set of a verification program.
pub fn read_program_info(program: &[u8]) -> Result<ProgramInfo> {
    let invalid = |reason: String| CodecError::InvalidValue {
        field: "verification program",
        reason,
    };

    match program.last() {
        Some(&op) if op == OpCode::CheckSig as u8 => {
            let mut reader = ProgramReader::new(&program[..program.len() - 1]);
            let key = reader.read_push()?;
            if !reader.is_done() {
                return Err(invalid("trailing bytes after public key".into()).into());
            }
            Ok(ProgramInfo {
                m: 1,
                public_keys: vec![PublicKey::from_bytes(&key)?],
            })
        }
        Some(&op) if op == OpCode::CheckMultiSig as u8 => {
            let mut reader = ProgramReader::new(&program[..program.len() - 1]);
            let mut items = Vec::new();
            while !reader.is_done() {
                items.push(reader.read_item()?);
            }
            if items.len() < 3 {
                return Err(invalid(format!("{} pushes is too few for m-of-n", items.len())).into());
            }
            let m = items[0].as_int()?;
            let n = items[items.len() - 1].as_int()?;
            let mut public_keys = Vec::with_capacity(items.len() - 2);
            for item in &items[1..items.len() - 1] {
                match item {
                    PushItem::Bytes(key) => public_keys.push(PublicKey::from_bytes(key)?),
                    PushItem::Int(_) => return Err(invalid("expected a public key push".into()).into()),
                }
            }
            if n != public_keys.len() as i128 || m < 1 || m > n || n > MULTI_SIG_MAX_KEYS as i128 {
                return Err(invalid(format!(
                    "inconsistent multi-sig header m={} n={} keys={}",
                    m,
                    n,
                    public_keys.len()
                ))
                .into());
            }
            Ok(ProgramInfo {
                m: m as u16,
                public_keys,
            })
        }
        _ => Err(invalid("unsupported verification program".into()).into()),
    }
}

/// Decode the signatures of an invocation program.
pub fn read_invocation(program: &[u8]) -> Result<Vec<Signature>> {
    let mut reader = ProgramReader::new(program);
    let mut signatures = Vec::new();
    while !reader.is_done() {
        let bytes = reader.read_push()?;
        signatures.push(Signature::from_bytes(&bytes)?);
    }
    Ok(signatures)
}
