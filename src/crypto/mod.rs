//! Key material, signatures, digests and addresses.
//!
//! # Data Flow
//! ```text
//! PrivateKey ──derive──▶ PublicKey ──program──▶ Address (hash160)
//!     │
//!     └──sign(digest)──▶ Signature (scheme byte || r || s)
//! ```
//!
//! # Security Constraints
//! - A `PrivateKey` is owned by exactly one value: it is not `Clone`
//! - Private keys never appear in `Debug` output or logs
//! - Signing is RFC 6979 deterministic ECDSA over NIST P-256 with SHA-256

pub mod address;
pub mod keys;
pub mod signature;

pub use address::Address;
pub use keys::{PrivateKey, PublicKey};
pub use signature::{Signature, SignatureScheme};

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors produced by key handling and signing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// Private key bytes are not a valid scalar.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Public key bytes are not a valid curve point.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes are malformed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Multi-signature parameters are inconsistent.
    #[error("Invalid multi-signature setup: {0}")]
    InvalidMultiSig(String),
}

/// SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Double SHA-256, used for transaction hashes and address checksums.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160 of SHA-256, used to derive addresses from programs.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash256_is_double_sha256() {
        assert_eq!(hash256(b"abc"), sha256(&sha256(b"abc")));
    }

    #[test]
    fn test_hash160_width() {
        assert_eq!(hash160(b"").len(), 20);
        assert_ne!(hash160(b"a"), hash160(b"b"));
    }
}
