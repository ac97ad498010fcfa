//! ONT ID registry calls.
//!
//! Every method takes a single struct argument whose first field is the
//! identifier's UTF-8 bytes. Read-only methods (`getDDO`, `getPublicKeys`,
//! `getAttributes`) are meant to be pre-executed rather than committed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::CodecError;
use crate::crypto::{Address, PublicKey};
use crate::error::Result;
use crate::script::NativeParam;
use crate::transaction::builder::make_native_invoke;
use crate::transaction::tx::UnsignedTransaction;

/// Address of the identity registry native contract.
pub const ONT_ID_CONTRACT: Address = Address::native(3);

/// Scheme prefix of every identifier.
pub const ONT_ID_PREFIX: &str = "did:ont:";

/// A decentralized identifier: `did:ont:` followed by a base58 address.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OntId {
    id: String,
    address: Address,
}

impl OntId {
    pub fn from_address(address: Address) -> Self {
        Self {
            id: format!("{}{}", ONT_ID_PREFIX, address.to_base58()),
            address,
        }
    }

    /// Identifier controlled by a single key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self::from_address(public_key.address())
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    fn param(&self) -> NativeParam {
        NativeParam::from(self.id.as_str())
    }
}

impl FromStr for OntId {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let encoded = s.strip_prefix(ONT_ID_PREFIX).ok_or_else(|| CodecError::InvalidValue {
            field: "ont id",
            reason: format!("missing {} prefix", ONT_ID_PREFIX),
        })?;
        Ok(Self::from_address(Address::from_base58(encoded)?))
    }
}

impl fmt::Display for OntId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Debug for OntId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OntId({})", self.id)
    }
}

impl Serialize for OntId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for OntId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn identity_call(
    method: &str,
    fields: Vec<NativeParam>,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    make_native_invoke(
        method,
        &[NativeParam::Struct(fields)],
        &ONT_ID_CONTRACT,
        gas_price,
        gas_limit,
        payer,
    )
}

/// Register `ont_id` with `public_key` as its first controlling key.
pub fn register_identity(
    ont_id: &OntId,
    public_key: &PublicKey,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    identity_call(
        "regIDWithPublicKey",
        vec![ont_id.param(), public_key.to_bytes().to_vec().into()],
        gas_price,
        gas_limit,
        payer,
    )
}

/// Query the identity's description object. Pre-execute this.
pub fn get_ddo(ont_id: &OntId) -> Result<UnsignedTransaction> {
    identity_call("getDDO", vec![ont_id.param()], 0, 0, None)
}

/// Authorize `new_key`, signed by an existing controller `signer`.
pub fn add_public_key(
    ont_id: &OntId,
    new_key: &PublicKey,
    signer: &PublicKey,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    identity_call(
        "addKey",
        vec![
            ont_id.param(),
            new_key.to_bytes().to_vec().into(),
            signer.to_bytes().to_vec().into(),
        ],
        gas_price,
        gas_limit,
        payer,
    )
}

/// Revoke `removed`, signed by an existing controller `signer`.
pub fn remove_public_key(
    ont_id: &OntId,
    removed: &PublicKey,
    signer: &PublicKey,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    identity_call(
        "removeKey",
        vec![
            ont_id.param(),
            removed.to_bytes().to_vec().into(),
            signer.to_bytes().to_vec().into(),
        ],
        gas_price,
        gas_limit,
        payer,
    )
}

/// Set the recovery address allowed to reset the identity's keys.
pub fn add_recovery(
    ont_id: &OntId,
    recovery: &Address,
    signer: &PublicKey,
    gas_price: u64,
    gas_limit: u64,
    payer: Option<Address>,
) -> Result<UnsignedTransaction> {
    identity_call(
        "addRecovery",
        vec![
            ont_id.param(),
            NativeParam::from(recovery),
            signer.to_bytes().to_vec().into(),
        ],
        gas_price,
        gas_limit,
        payer,
    )
}

/// Query the identity's public keys. Pre-execute this.
pub fn get_public_keys(ont_id: &OntId) -> Result<UnsignedTransaction> {
    identity_call("getPublicKeys", vec![ont_id.param()], 0, 0, None)
}

/// Query the identity's attributes. Pre-execute this.
pub fn get_attributes(ont_id: &OntId) -> Result<UnsignedTransaction> {
    identity_call("getAttributes", vec![ont_id.param()], 0, 0, None)
}
