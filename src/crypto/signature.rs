//! Serialized signatures.

use std::fmt;

use crate::crypto::SigningError;

/// Signature schemes understood by the node. Only ECDSA/SHA-256 is produced here.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    EcdsaWithSha224 = 0,
    EcdsaWithSha256 = 1,
    EcdsaWithSha384 = 2,
    EcdsaWithSha512 = 3,
    EcdsaWithSha3_224 = 4,
    EcdsaWithSha3_256 = 5,
    EcdsaWithSha3_384 = 6,
    EcdsaWithSha3_512 = 7,
    EcdsaWithRipemd160 = 8,
    Sm2WithSm3 = 9,
    Ed25519 = 10,
}

impl TryFrom<u8> for SignatureScheme {
    type Error = SigningError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use SignatureScheme::*;
        Ok(match value {
            0 => EcdsaWithSha224,
            1 => EcdsaWithSha256,
            2 => EcdsaWithSha384,
            3 => EcdsaWithSha512,
            4 => EcdsaWithSha3_224,
            5 => EcdsaWithSha3_256,
            6 => EcdsaWithSha3_384,
            7 => EcdsaWithSha3_512,
            8 => EcdsaWithRipemd160,
            9 => Sm2WithSm3,
            10 => Ed25519,
            other => {
                return Err(SigningError::InvalidSignature(format!(
                    "unknown signature scheme {}",
                    other
                )))
            }
        })
    }
}

/// A signature as carried in an invocation script: `scheme || r || s`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    scheme: SignatureScheme,
    value: [u8; 64],
}

impl Signature {
    pub fn new(scheme: SignatureScheme, value: [u8; 64]) -> Self {
        Self { scheme, value }
    }

    /// Parse a 65-byte `scheme || r || s` signature, or a bare 64-byte
    /// `r || s` which the node treats as ECDSA/SHA-256.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let (scheme, raw) = match bytes.len() {
            64 => (SignatureScheme::EcdsaWithSha256, bytes),
            65 => (SignatureScheme::try_from(bytes[0])?, &bytes[1..]),
            n => {
                return Err(SigningError::InvalidSignature(format!(
                    "expected 64 or 65 bytes, got {}",
                    n
                )))
            }
        };
        let mut value = [0u8; 64];
        value.copy_from_slice(raw);
        Ok(Self { scheme, value })
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// The raw `r || s` bytes.
    pub fn value(&self) -> &[u8; 64] {
        &self.value
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(65);
        out.push(self.scheme as u8);
        out.extend_from_slice(&self.value);
        out
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:?}, {})", self.scheme, hex::encode(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_bytes_round_trip() {
        let sig = Signature::new(SignatureScheme::EcdsaWithSha256, [9u8; 64]);
        let bytes = sig.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(Signature::from_bytes(&bytes).unwrap(), sig);
    }

    #[test]
    fn test_bare_signature_defaults_to_sha256() {
        let sig = Signature::from_bytes(&[3u8; 64]).unwrap();
        assert_eq!(sig.scheme(), SignatureScheme::EcdsaWithSha256);
    }

    #[test]
    fn test_bad_signature_length() {
        assert!(Signature::from_bytes(&[0u8; 10]).is_err());
        let mut bytes = vec![42u8];
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(Signature::from_bytes(&bytes).is_err());
    }
}
