//! Crate-wide error type.

use thiserror::Error;

pub use crate::codec::CodecError;
pub use crate::crypto::SigningError;
pub use crate::response::NodeError;
pub use crate::transport::TransportError;

/// Errors that can occur while building, signing, submitting or querying.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A value could not be encoded or decoded. Never retried.
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// Key material or signature is invalid. Never retried.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// The request did not complete. Callers may retry.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The node answered with an explicit error.
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    /// The node answered successfully but the payload had an unexpected shape.
    #[error("Failed to decode {method} response: {reason}")]
    Decode { method: String, reason: String },

    /// The client was built from an unusable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
