//! 20-byte account and contract addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{CodecError, Decode, Encode, Sink, Source};
use crate::crypto::{hash160, hash256, PublicKey};
use crate::error::Result;
use crate::script::program;

pub const ADDRESS_LEN: usize = 20;

/// Version byte prepended before base58 encoding.
pub const ADDRESS_VERSION: u8 = 0x17;

/// Hash of a verification program (or a contract's code).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address of a native contract: nineteen zero bytes then `id`.
    pub const fn native(id: u8) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = id;
        Self(bytes)
    }

    pub fn from_program(program: &[u8]) -> Self {
        Self(hash160(program))
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        // A 33-byte push followed by CHECKSIG cannot overflow the builder.
        let mut program = Vec::with_capacity(35);
        program.push(33);
        program.extend_from_slice(&public_key.to_bytes());
        program.push(crate::script::OpCode::CheckSig as u8);
        Self::from_program(&program)
    }

    /// Address of the m-of-n program over `public_keys`.
    pub fn from_multi_public_keys(m: u16, public_keys: &[PublicKey]) -> Result<Self> {
        Ok(Self::from_program(&program::multi_sig_program(m, public_keys)?))
    }

    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, CodecError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(CodecError::InvalidValue {
                field: "address",
                reason: format!("expected {} bytes, got {}", ADDRESS_LEN, bytes.len()),
            });
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Base58check with the address version byte.
    pub fn to_base58(&self) -> String {
        let mut data = Vec::with_capacity(ADDRESS_LEN + 5);
        data.push(ADDRESS_VERSION);
        data.extend_from_slice(&self.0);
        let checksum = hash256(&data);
        data.extend_from_slice(&checksum[..4]);
        bs58::encode(data).into_string()
    }

    pub fn from_base58(encoded: &str) -> std::result::Result<Self, CodecError> {
        let invalid = |reason: String| CodecError::InvalidValue {
            field: "base58 address",
            reason,
        };
        let data = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| invalid(e.to_string()))?;
        if data.len() != ADDRESS_LEN + 5 {
            return Err(invalid(format!("decoded to {} bytes", data.len())));
        }
        if data[0] != ADDRESS_VERSION {
            return Err(invalid(format!("unexpected version byte 0x{:02x}", data[0])));
        }
        let checksum = hash256(&data[..ADDRESS_LEN + 1]);
        if checksum[..4] != data[ADDRESS_LEN + 1..] {
            return Err(invalid("checksum mismatch".into()));
        }
        Self::from_slice(&data[1..ADDRESS_LEN + 1])
    }

    /// Hex in the node's display order (bytes reversed).
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    pub fn from_hex(display_hex: &str) -> std::result::Result<Self, CodecError> {
        let mut bytes = hex::decode(display_hex).map_err(|e| CodecError::InvalidValue {
            field: "hex address",
            reason: e.to_string(),
        })?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

impl Encode for Address {
    fn encode(&self, sink: &mut Sink) -> std::result::Result<(), CodecError> {
        sink.write_bytes(&self.0);
        Ok(())
    }
}

impl Decode for Address {
    fn decode(source: &mut Source<'_>) -> std::result::Result<Self, CodecError> {
        Ok(Self(source.read_array("address")?))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}
