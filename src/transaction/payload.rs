//! Type-specific transaction payloads.

use crate::codec::{CodecError, Sink, Source};

/// Transaction type tag.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    Deploy = 0xd0,
    Invoke = 0xd1,
}

impl TryFrom<u8> for TxType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xd0 => Ok(TxType::Deploy),
            0xd1 => Ok(TxType::Invoke),
            other => Err(CodecError::InvalidValue {
                field: "tx_type",
                reason: format!("unsupported transaction type 0x{:02x}", other),
            }),
        }
    }
}

/// Metadata and code for a contract deployment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeployCode {
    pub code: Vec<u8>,
    pub need_storage: bool,
    pub name: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

/// The part of a transaction that says what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Run VM code (native contract calls included).
    Invoke { code: Vec<u8> },
    /// Deploy a contract.
    Deploy(DeployCode),
}

impl Payload {
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::Invoke { .. } => TxType::Invoke,
            Payload::Deploy(_) => TxType::Deploy,
        }
    }

    pub fn encode(&self, sink: &mut Sink) {
        match self {
            Payload::Invoke { code } => sink.write_var_bytes(code),
            Payload::Deploy(deploy) => {
                sink.write_var_bytes(&deploy.code);
                sink.write_bool(deploy.need_storage);
                sink.write_var_str(&deploy.name);
                sink.write_var_str(&deploy.version);
                sink.write_var_str(&deploy.author);
                sink.write_var_str(&deploy.email);
                sink.write_var_str(&deploy.description);
            }
        }
    }

    pub fn decode(tx_type: TxType, source: &mut Source<'_>) -> Result<Self, CodecError> {
        Ok(match tx_type {
            TxType::Invoke => Payload::Invoke {
                code: source.read_var_bytes("invoke code")?,
            },
            TxType::Deploy => Payload::Deploy(DeployCode {
                code: source.read_var_bytes("deploy code")?,
                need_storage: source.read_bool("need_storage")?,
                name: source.read_var_str("name")?,
                version: source.read_var_str("version")?,
                author: source.read_var_str("author")?,
                email: source.read_var_str("email")?,
                description: source.read_var_str("description")?,
            }),
        })
    }
}
