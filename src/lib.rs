//! Client library for an Ontology-style chain.
//!
//! Builds native-contract transactions, signs them with P-256 keys,
//! encodes them to the canonical wire format, and submits or queries them
//! over the node's REST or WebSocket API with one response contract.
//!
//! # Data Flow
//! ```text
//! builder ──▶ UnsignedTransaction ──sign──▶ SignedTransaction ──serialize──▶ bytes
//!                                                                              │
//! caller ◀── Envelope ◀── RawResponse ◀── Transport (REST | WebSocket) ◀───────┘
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod response;
pub mod script;
pub mod transaction;
pub mod transport;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use client::RpcClient;
pub use config::ClientConfig;
pub use crypto::{Address, PrivateKey, PublicKey, Signature};
pub use error::{ClientError, Result};
pub use response::{Envelope, NodeError};
pub use transaction::{SignedTransaction, Transaction, TxHash, UnsignedTransaction};
pub use transport::{Method, RestTransport, Transport, TransportError, WebSocketTransport};
