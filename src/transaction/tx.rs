//! Unsigned and signed transactions.
//!
//! A transaction starts as an [`UnsignedTransaction`] whose fields can be
//! edited freely. Signing consumes it and yields a [`SignedTransaction`],
//! which has no setters: the hash every signature covers is computed once
//! and can no longer drift from the bytes that get submitted. To change a
//! field after signing, call [`SignedTransaction::into_unsigned`] and sign
//! again.

use std::fmt;

use crate::codec::{CodecError, Decode, Encode, Sink, Source};
use crate::crypto::{hash256, Address, PrivateKey, PublicKey, Signature, SigningError};
use crate::error::Result;
use crate::script::program::{self, ProgramInfo};
use crate::transaction::payload::{Payload, TxType};

/// Only transaction version understood by the node.
pub const TX_VERSION: u8 = 0;

/// Most signature entries a transaction may carry.
pub const TX_MAX_SIG_SIZE: usize = 16;

/// Double SHA-256 of the signable fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest bytes in the order they are signed.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex in the node's lookup order (bytes reversed).
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    pub fn from_hex(display_hex: &str) -> std::result::Result<Self, CodecError> {
        let invalid = |reason: String| CodecError::InvalidValue {
            field: "transaction hash",
            reason,
        };
        let mut bytes = hex::decode(display_hex).map_err(|e| invalid(e.to_string()))?;
        if bytes.len() != Self::LEN {
            return Err(invalid(format!("expected {} bytes, got {}", Self::LEN, bytes.len())));
        }
        bytes.reverse();
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

/// Every field covered by the transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignableFields {
    version: u8,
    nonce: u32,
    gas_price: u64,
    gas_limit: u64,
    payer: Address,
    payload: Payload,
}

impl Encode for SignableFields {
    fn encode(&self, sink: &mut Sink) -> std::result::Result<(), CodecError> {
        sink.write_u8(self.version);
        sink.write_u8(self.payload.tx_type() as u8);
        sink.write_u32(self.nonce);
        sink.write_u64(self.gas_price);
        sink.write_u64(self.gas_limit);
        self.payer.encode(sink)?;
        self.payload.encode(sink);
        // Attributes are unused; always an empty list.
        sink.write_var_uint(0);
        Ok(())
    }
}

impl Decode for SignableFields {
    fn decode(source: &mut Source<'_>) -> std::result::Result<Self, CodecError> {
        let version = source.read_u8("version")?;
        let tx_type = TxType::try_from(source.read_u8("tx_type")?)?;
        let nonce = source.read_u32("nonce")?;
        let gas_price = source.read_u64("gas_price")?;
        let gas_limit = source.read_u64("gas_limit")?;
        let payer = Address::decode(source)?;
        let payload = Payload::decode(tx_type, source)?;
        let attributes = source.read_var_uint("attributes")?;
        if attributes != 0 {
            return Err(CodecError::InvalidValue {
                field: "attributes",
                reason: format!("expected none, got {}", attributes),
            });
        }
        Ok(Self {
            version,
            nonce,
            gas_price,
            gas_limit,
            payer,
            payload,
        })
    }
}

impl SignableFields {
    fn hash(&self) -> Result<TxHash> {
        Ok(TxHash(hash256(&self.to_bytes()?)))
    }
}

/// Signatures from one signer set (a single key or an m-of-n group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSignature {
    pub program: ProgramInfo,
    pub signatures: Vec<Signature>,
}

impl TxSignature {
    fn encode(&self, sink: &mut Sink) -> Result<()> {
        sink.write_var_bytes(&program::invocation_program(&self.signatures)?);
        sink.write_var_bytes(&program::verification_program(&self.program)?);
        Ok(())
    }

    fn decode(source: &mut Source<'_>) -> Result<Self> {
        let invocation = source.read_var_bytes("invocation program")?;
        let verification = source.read_var_bytes("verification program")?;
        Ok(Self {
            program: program::read_program_info(&verification)?,
            signatures: program::read_invocation(&invocation)?,
        })
    }

    /// At least `m` signatures, each from a distinct key in the set.
    fn verify(&self, hash: &TxHash) -> bool {
        let mut used = vec![false; self.program.public_keys.len()];
        let mut valid = 0usize;
        for sig in &self.signatures {
            let signer = self
                .program
                .public_keys
                .iter()
                .enumerate()
                .find(|(i, key)| !used[*i] && key.verify(hash.as_bytes(), sig));
            match signer {
                Some((i, _)) => {
                    used[i] = true;
                    valid += 1;
                }
                None => return false,
            }
        }
        valid >= self.program.m as usize
    }
}

/// A transaction that has not been signed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    fields: SignableFields,
}

impl UnsignedTransaction {
    /// A transaction with a random nonce and a zero payer.
    pub fn new(payload: Payload, gas_price: u64, gas_limit: u64) -> Self {
        Self {
            fields: SignableFields {
                version: TX_VERSION,
                nonce: rand::random(),
                gas_price,
                gas_limit,
                payer: Address::default(),
                payload,
            },
        }
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.fields.nonce = nonce;
        self
    }

    pub fn with_payer(mut self, payer: Address) -> Self {
        self.fields.payer = payer;
        self
    }

    pub fn set_nonce(&mut self, nonce: u32) {
        self.fields.nonce = nonce;
    }

    pub fn set_gas_price(&mut self, gas_price: u64) {
        self.fields.gas_price = gas_price;
    }

    pub fn set_gas_limit(&mut self, gas_limit: u64) {
        self.fields.gas_limit = gas_limit;
    }

    pub fn set_payer(&mut self, payer: Address) {
        self.fields.payer = payer;
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.fields.payload = payload;
    }

    pub fn tx_type(&self) -> TxType {
        self.fields.payload.tx_type()
    }

    pub fn nonce(&self) -> u32 {
        self.fields.nonce
    }

    pub fn gas_price(&self) -> u64 {
        self.fields.gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.fields.gas_limit
    }

    pub fn payer(&self) -> &Address {
        &self.fields.payer
    }

    pub fn payload(&self) -> &Payload {
        &self.fields.payload
    }

    pub fn hash(&self) -> Result<TxHash> {
        self.fields.hash()
    }

    /// Wire bytes with an empty signature list, as sent for pre-execution.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut sink = Sink::new();
        self.fields.encode(&mut sink)?;
        sink.write_var_uint(0);
        Ok(sink.into_bytes())
    }

    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.serialize()?))
    }

    /// Sign with a single key, freezing every signable field.
    pub fn sign(self, key: &PrivateKey) -> Result<SignedTransaction> {
        let mut signed = SignedTransaction::freeze(self.fields)?;
        signed.add_signature(key)?;
        Ok(signed)
    }

    /// Sign as one member of an m-of-n group.
    pub fn sign_multi(self, m: u16, public_keys: &[PublicKey], key: &PrivateKey) -> Result<SignedTransaction> {
        let mut signed = SignedTransaction::freeze(self.fields)?;
        signed.add_multi_signature(m, public_keys, key)?;
        Ok(signed)
    }
}

/// A transaction with at least one signature entry. Its signable fields are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    fields: SignableFields,
    hash: TxHash,
    sigs: Vec<TxSignature>,
}

impl SignedTransaction {
    fn freeze(fields: SignableFields) -> Result<Self> {
        let hash = fields.hash()?;
        Ok(Self {
            fields,
            hash,
            sigs: Vec::new(),
        })
    }

    /// Append a single-key signature over the frozen hash.
    pub fn add_signature(&mut self, key: &PrivateKey) -> Result<()> {
        if self.sigs.len() >= TX_MAX_SIG_SIZE {
            return Err(SigningError::InvalidMultiSig(format!(
                "transaction already carries {} signature entries",
                TX_MAX_SIG_SIZE
            ))
            .into());
        }
        let public_key = key.public_key();
        let signature = key.sign(self.hash.as_bytes());
        tracing::debug!(tx_hash = %self.hash, signer = %public_key.address(), "Transaction signed");
        self.sigs.push(TxSignature {
            program: ProgramInfo {
                m: 1,
                public_keys: vec![public_key],
            },
            signatures: vec![signature],
        });
        Ok(())
    }

    /// Add `key`'s signature to the m-of-n entry for `public_keys`,
    /// creating the entry if this is its first signature.
    pub fn add_multi_signature(&mut self, m: u16, public_keys: &[PublicKey], key: &PrivateKey) -> Result<()> {
        // Validates m and n.
        program::multi_sig_program(m, public_keys)?;
        let public_key = key.public_key();
        if !public_keys.contains(&public_key) {
            return Err(SigningError::InvalidMultiSig(
                "signing key is not a member of the multi-signature set".into(),
            )
            .into());
        }
        let mut sorted = public_keys.to_vec();
        sorted.sort();
        let info = ProgramInfo {
            m,
            public_keys: sorted,
        };
        let signature = key.sign(self.hash.as_bytes());

        if let Some(entry) = self.sigs.iter_mut().find(|s| s.program == info) {
            if entry.signatures.len() >= info.public_keys.len() {
                return Err(SigningError::InvalidMultiSig("every member has already signed".into()).into());
            }
            if entry.signatures.iter().any(|s| public_key.verify(self.hash.as_bytes(), s)) {
                return Err(SigningError::InvalidMultiSig("key has already signed".into()).into());
            }
            entry.signatures.push(signature);
        } else {
            if self.sigs.len() >= TX_MAX_SIG_SIZE {
                return Err(SigningError::InvalidMultiSig(format!(
                    "transaction already carries {} signature entries",
                    TX_MAX_SIG_SIZE
                ))
                .into());
            }
            self.sigs.push(TxSignature {
                program: info,
                signatures: vec![signature],
            });
        }
        tracing::debug!(tx_hash = %self.hash, signer = %public_key.address(), m, "Multi-signature added");
        Ok(())
    }

    /// Drop every signature so fields can be edited again.
    pub fn into_unsigned(self) -> UnsignedTransaction {
        UnsignedTransaction { fields: self.fields }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn signatures(&self) -> &[TxSignature] {
        &self.sigs
    }

    pub fn tx_type(&self) -> TxType {
        self.fields.payload.tx_type()
    }

    pub fn nonce(&self) -> u32 {
        self.fields.nonce
    }

    pub fn gas_price(&self) -> u64 {
        self.fields.gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.fields.gas_limit
    }

    pub fn payer(&self) -> &Address {
        &self.fields.payer
    }

    pub fn payload(&self) -> &Payload {
        &self.fields.payload
    }

    /// Every entry meets its threshold with valid, distinct signers.
    pub fn verify_signatures(&self) -> bool {
        !self.sigs.is_empty() && self.sigs.iter().all(|s| s.verify(&self.hash))
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut sink = Sink::new();
        self.fields.encode(&mut sink)?;
        sink.write_var_uint(self.sigs.len() as u64);
        for sig in &self.sigs {
            sig.encode(&mut sink)?;
        }
        Ok(sink.into_bytes())
    }

    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.serialize()?))
    }
}

/// A transaction decoded from wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Unsigned(UnsignedTransaction),
    Signed(SignedTransaction),
}

impl Transaction {
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let mut source = Source::new(bytes);
        let fields = SignableFields::decode(&mut source)?;
        let count = source.read_var_uint("signature count")?;
        if (count as usize) > TX_MAX_SIG_SIZE {
            return Err(CodecError::InvalidValue {
                field: "signature count",
                reason: format!("{} exceeds {}", count, TX_MAX_SIG_SIZE),
            }
            .into());
        }
        let mut sigs = Vec::with_capacity(count as usize);
        for _ in 0..count {
            sigs.push(TxSignature::decode(&mut source)?);
        }
        if source.remaining() > 0 {
            return Err(CodecError::TrailingBytes(source.remaining()).into());
        }
        if sigs.is_empty() {
            return Ok(Transaction::Unsigned(UnsignedTransaction { fields }));
        }
        let mut signed = SignedTransaction::freeze(fields)?;
        signed.sigs = sigs;
        Ok(Transaction::Signed(signed))
    }

    pub fn from_hex(raw_hex: &str) -> Result<Self> {
        let bytes = hex::decode(raw_hex).map_err(|e| CodecError::InvalidValue {
            field: "raw transaction",
            reason: e.to_string(),
        })?;
        Self::deserialize(&bytes)
    }

    pub fn hash(&self) -> Result<TxHash> {
        match self {
            Transaction::Unsigned(tx) => tx.hash(),
            Transaction::Signed(tx) => Ok(tx.hash()),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            Transaction::Unsigned(tx) => tx.serialize(),
            Transaction::Signed(tx) => tx.serialize(),
        }
    }
}

impl From<UnsignedTransaction> for Transaction {
    fn from(tx: UnsignedTransaction) -> Self {
        Transaction::Unsigned(tx)
    }
}

impl From<SignedTransaction> for Transaction {
    fn from(tx: SignedTransaction) -> Self {
        Transaction::Signed(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UnsignedTransaction {
        UnsignedTransaction::new(Payload::Invoke { code: vec![0x51, 0x52] }, 500, 30_000)
            .with_nonce(7)
            .with_payer(Address::native(9))
    }

    #[test]
    fn test_unsigned_layout() {
        let bytes = sample().serialize().unwrap();
        assert_eq!(bytes[0], TX_VERSION);
        assert_eq!(bytes[1], 0xd1);
        assert_eq!(&bytes[2..6], &7u32.to_le_bytes());
        assert_eq!(&bytes[6..14], &500u64.to_le_bytes());
        assert_eq!(&bytes[14..22], &30_000u64.to_le_bytes());
        assert_eq!(&bytes[22..42], Address::native(9).as_bytes());
        assert_eq!(&bytes[42..45], &[0x02, 0x51, 0x52]);
        // attributes, then signature count
        assert_eq!(&bytes[45..], &[0x00, 0x00]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let mut a = sample();
        let b = sample();
        a.set_gas_limit(1);
        a.set_gas_limit(30_000);
        assert_eq!(a.serialize().unwrap(), b.serialize().unwrap());
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_changing_a_field_changes_the_hash() {
        let key = PrivateKey::random();
        let signed = sample().sign(&key).unwrap();
        let original = signed.hash();

        let mut edited = signed.into_unsigned();
        edited.set_gas_price(501);
        let resigned = edited.sign(&key).unwrap();
        assert_ne!(resigned.hash(), original);
    }

    #[test]
    fn test_signature_covers_hash() {
        let key = PrivateKey::random();
        let signed = sample().sign(&key).unwrap();
        assert!(signed.verify_signatures());
        assert_eq!(signed.hash(), sample().hash().unwrap());
        assert_eq!(signed.signatures().len(), 1);
    }

    #[test]
    fn test_additional_signatures_keep_earlier_ones_valid() {
        let first = PrivateKey::random();
        let second = PrivateKey::random();
        let mut signed = sample().sign(&first).unwrap();
        let hash = signed.hash();
        signed.add_signature(&second).unwrap();
        assert_eq!(signed.hash(), hash);
        assert_eq!(signed.signatures().len(), 2);
        assert!(signed.verify_signatures());
    }

    #[test]
    fn test_multi_signature_accumulates_in_one_entry() {
        let keys: Vec<PrivateKey> = (0..3).map(|_| PrivateKey::random()).collect();
        let public_keys: Vec<PublicKey> = keys.iter().map(|k| k.public_key()).collect();

        let mut signed = sample().sign_multi(2, &public_keys, &keys[0]).unwrap();
        assert!(!signed.verify_signatures());
        signed.add_multi_signature(2, &public_keys, &keys[2]).unwrap();
        assert_eq!(signed.signatures().len(), 1);
        assert_eq!(signed.signatures()[0].signatures.len(), 2);
        assert!(signed.verify_signatures());

        assert!(signed.add_multi_signature(2, &public_keys, &keys[2]).is_err());
        let outsider = PrivateKey::random();
        assert!(signed.add_multi_signature(2, &public_keys, &outsider).is_err());
    }

    #[test]
    fn test_signed_round_trip() {
        let key = PrivateKey::random();
        let signed = sample().sign(&key).unwrap();
        let bytes = signed.serialize().unwrap();
        match Transaction::deserialize(&bytes).unwrap() {
            Transaction::Signed(decoded) => {
                assert_eq!(decoded, signed);
                assert!(decoded.verify_signatures());
            }
            Transaction::Unsigned(_) => panic!("expected a signed transaction"),
        }
    }

    #[test]
    fn test_unsigned_round_trip() {
        let tx = sample();
        let decoded = Transaction::from_hex(&tx.to_hex().unwrap()).unwrap();
        assert_eq!(decoded, Transaction::Unsigned(tx));
    }

    #[test]
    fn test_deserialize_rejects_truncation() {
        let bytes = sample().serialize().unwrap();
        let err = Transaction::deserialize(&bytes[..10]).unwrap_err();
        assert!(err.to_string().contains("gas_price"));
    }

    #[test]
    fn test_hash_hex_is_reversed() {
        let hash = sample().hash().unwrap();
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(&hex[..2], &hex::encode([hash.as_bytes()[31]]));
        assert_eq!(TxHash::from_hex(&hex).unwrap(), hash);
    }
}
