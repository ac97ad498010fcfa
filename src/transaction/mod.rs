//! Transaction model and builders.
//!
//! # Responsibilities
//! - Hold the signable fields and encode them canonically
//! - Enforce that signable fields are frozen once a signature is attached
//! - Build native contract calls (identity, assets) and deployments
//!
//! # Data Flow
//! ```text
//! builder ──▶ UnsignedTransaction ──sign(&PrivateKey)──▶ SignedTransaction ──serialize──▶ bytes
//!                  │                                           │
//!                  └──serialize (no sigs)──▶ pre-execute       └──into_unsigned──▶ edit & re-sign
//! ```

pub mod asset;
pub mod builder;
pub mod deploy;
pub mod identity;
pub mod payload;
pub mod tx;

pub use builder::{make_invoke, make_native_invoke};
pub use payload::{DeployCode, Payload, TxType};
pub use tx::{
    SignedTransaction, Transaction, TxHash, TxSignature, UnsignedTransaction, TX_MAX_SIG_SIZE,
    TX_VERSION,
};

/// Gas price used when the caller does not configure one.
pub const DEFAULT_GAS_PRICE: u64 = 500;

/// Gas limit used when the caller does not configure one.
pub const DEFAULT_GAS_LIMIT: u64 = 20_000;
