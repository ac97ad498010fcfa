//! P-256 key pairs.
//!
//! # Security
//! - Private keys can be loaded from hex or an environment variable
//! - Keys are never logged or serialized
//! - The underlying signing key zeroizes its memory on drop

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;

use crate::crypto::signature::{Signature, SignatureScheme};
use crate::crypto::SigningError;

/// Length of a SEC1 compressed public key.
pub const PUBLIC_KEY_LEN: usize = 33;

/// A P-256 private key.
///
/// Deliberately not `Clone`: signing calls borrow it.
pub struct PrivateKey {
    key: SigningKey,
}

impl PrivateKey {
    /// Generate a key from OS randomness.
    pub fn random() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key from its 32 raw scalar bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        if bytes.len() != 32 {
            return Err(SigningError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| SigningError::InvalidKey(format!("not a valid P-256 scalar: {}", e)))?;
        Ok(Self { key })
    }

    /// Create a key from a hex string (with or without 0x prefix).
    pub fn from_hex(private_key_hex: &str) -> Result<Self, SigningError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let bytes = hex::decode(key_hex)
            .map_err(|e| SigningError::InvalidKey(format!("Invalid private key format: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Load a hex key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, SigningError> {
        let private_key = std::env::var(var).map_err(|_| {
            SigningError::InvalidKey(format!("Environment variable {} not set", var))
        })?;
        let key = Self::from_hex(private_key.trim())?;
        tracing::info!(address = %key.public_key().address(), "Signing key loaded from environment");
        Ok(key)
    }

    /// Derive the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.key.verifying_key().clone())
    }

    /// Sign `message` with ECDSA/SHA-256.
    ///
    /// The message is hashed with SHA-256 before signing, so callers pass
    /// the transaction digest itself rather than a pre-hashed value of it.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig: EcdsaSignature = self.key.sign(message);
        let mut value = [0u8; 64];
        value.copy_from_slice(&sig.to_bytes());
        Signature::new(SignatureScheme::EcdsaWithSha256, value)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// A P-256 public key, serialized in SEC1 compressed form.
#[derive(Clone)]
pub struct PublicKey {
    key: VerifyingKey,
    compressed: [u8; PUBLIC_KEY_LEN],
}

impl PublicKey {
    fn from_verifying_key(key: VerifyingKey) -> Self {
        let point = key.to_encoded_point(true);
        let mut compressed = [0u8; PUBLIC_KEY_LEN];
        compressed.copy_from_slice(point.as_bytes());
        Self { key, compressed }
    }

    /// Parse a compressed (33 bytes) or uncompressed (65 bytes) SEC1 key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| SigningError::InvalidPublicKey(format!("{} ({} bytes)", e, bytes.len())))?;
        Ok(Self::from_verifying_key(key))
    }

    pub fn from_hex(public_key_hex: &str) -> Result<Self, SigningError> {
        let bytes = hex::decode(public_key_hex)
            .map_err(|e| SigningError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The compressed encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.compressed
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.compressed)
    }

    /// Address of the single-key verification program for this key.
    pub fn address(&self) -> crate::crypto::Address {
        crate::crypto::Address::from_public_key(self)
    }

    /// Check `signature` over `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        if signature.scheme() != SignatureScheme::EcdsaWithSha256 {
            return false;
        }
        match EcdsaSignature::from_slice(signature.value()) {
            Ok(sig) => self.key.verify(message, &sig).is_ok(),
            Err(_) => false,
        }
    }

    /// Uncompressed X || Y, used to order keys inside multi-sig programs.
    fn coordinates(&self) -> Vec<u8> {
        self.key.to_encoded_point(false).as_bytes()[1..].to_vec()
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.compressed == other.compressed
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compressed.hash(state);
    }
}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by X coordinate, then Y, as the node sorts multi-sig keys.
impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coordinates().cmp(&other.coordinates())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
