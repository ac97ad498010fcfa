//! Transports to a node.
//!
//! # Responsibilities
//! - One capability set, `submit` and `query`, over two wire protocols
//! - Map each [`Method`] to a REST path and a WebSocket action
//! - Classify failures so callers can decide whether to retry
//!
//! # Data Flow
//! ```text
//!                  ┌── RestTransport ──── HTTP GET/POST ───┐
//! RpcClient ──▶ dyn Transport                              ├──▶ RawResponse ──▶ Envelope
//!                  └── WebSocketTransport ── JSON frames ──┘
//! ```
//!
//! # Design Decisions
//! - Connection state stays private to each transport
//! - Both transports return the same `Envelope` for the same node answer
//! - Transports never retry a call; `TransportError::is_retryable` says
//!   whether the caller may

pub mod rest;
pub mod websocket;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::crypto::Address;
use crate::error::Result;
use crate::response::Envelope;
use crate::transaction::asset::Asset;
use crate::transaction::{Transaction, TxHash};

pub use rest::RestTransport;
pub use websocket::{ConnectionState, SubscribeRequest, WebSocketTransport};

/// Protocol version sent with every request.
pub const API_VERSION: &str = "1.0.0";

/// Failures that happen before a node answer could be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No answer arrived before the deadline.
    #[error("{method} timed out after {after:?}")]
    Timeout {
        method: String,
        id: Option<String>,
        after: Duration,
    },

    /// The connection dropped while the request was in flight.
    #[error("connection lost while awaiting {method}")]
    ConnectionLost { method: String, id: Option<String> },

    /// The node could not be reached at all.
    #[error("{url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// The node answered with something that is not a response body.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Timeouts and connectivity failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. }
                | TransportError::ConnectionLost { .. }
                | TransportError::Unreachable { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Rest,
    WebSocket,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Rest => "rest",
            TransportKind::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block looked up by height or by hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Height(u32),
    Hash(String),
}

/// Read-only node queries.
///
/// `raw: true` asks for the hex wire encoding instead of JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    RawTransaction { hash: TxHash, raw: bool },
    Block { by: BlockRef, raw: bool },
    BlockHeight,
    BlockTxsByHeight { height: u32 },
    Balance { address: Address },
    Contract { hash: Address, raw: bool },
    SmartCodeEventByHash { hash: TxHash },
    SmartCodeEventByHeight { height: u32 },
    BlockHeightByTxHash { hash: TxHash },
    Storage { contract: Address, key: Vec<u8> },
    MerkleProof { hash: TxHash },
    NodeCount,
    GenerateBlockTime,
    GasPrice,
    Version,
    NetworkId,
    MempoolTxCount,
    MempoolTxState { hash: TxHash },
    UnboundOng { address: Address },
    GrantOng { address: Address },
    Allowance { asset: Asset, from: Address, to: Address },
}

fn raw_flag(raw: bool) -> &'static str {
    if raw {
        "1"
    } else {
        "0"
    }
}

impl Method {
    /// WebSocket action name, also used as the method label in logs and metrics.
    pub fn action(&self) -> &'static str {
        match self {
            Method::RawTransaction { .. } => "gettransaction",
            Method::Block { by: BlockRef::Height(_), .. } => "getblockbyheight",
            Method::Block { by: BlockRef::Hash(_), .. } => "getblockbyhash",
            Method::BlockHeight => "getblockheight",
            Method::BlockTxsByHeight { .. } => "getblocktxsbyheight",
            Method::Balance { .. } => "getbalance",
            Method::Contract { .. } => "getcontract",
            Method::SmartCodeEventByHash { .. } => "getsmartcodeeventbyhash",
            Method::SmartCodeEventByHeight { .. } => "getsmartcodeeventbyheight",
            Method::BlockHeightByTxHash { .. } => "getblockheightbytxhash",
            Method::Storage { .. } => "getstorage",
            Method::MerkleProof { .. } => "getmerkleproof",
            Method::NodeCount => "getconnectioncount",
            Method::GenerateBlockTime => "getgenerateblocktime",
            Method::GasPrice => "getgasprice",
            Method::Version => "getversion",
            Method::NetworkId => "getnetworkid",
            Method::MempoolTxCount => "getmempooltxcount",
            Method::MempoolTxState { .. } => "getmempooltxstate",
            Method::UnboundOng { .. } => "getunboundong",
            Method::GrantOng { .. } => "getgrantong",
            Method::Allowance { .. } => "getallowance",
        }
    }

    /// Path and query under the REST base URL.
    pub fn rest_path(&self) -> String {
        match self {
            Method::RawTransaction { hash, raw } => {
                format!("/api/v1/transaction/{}?raw={}", hash, raw_flag(*raw))
            }
            Method::Block { by: BlockRef::Height(h), raw } => {
                format!("/api/v1/block/details/height/{}?raw={}", h, raw_flag(*raw))
            }
            Method::Block { by: BlockRef::Hash(h), raw } => {
                format!("/api/v1/block/details/hash/{}?raw={}", h, raw_flag(*raw))
            }
            Method::BlockHeight => "/api/v1/block/height".to_string(),
            Method::BlockTxsByHeight { height } => format!("/api/v1/block/transactions/height/{}", height),
            Method::Balance { address } => format!("/api/v1/balance/{}", address),
            Method::Contract { hash, raw } => {
                format!("/api/v1/contract/{}?raw={}", hash.to_hex(), raw_flag(*raw))
            }
            Method::SmartCodeEventByHash { hash } => format!("/api/v1/smartcode/event/txhash/{}", hash),
            Method::SmartCodeEventByHeight { height } => {
                format!("/api/v1/smartcode/event/transactions/{}", height)
            }
            Method::BlockHeightByTxHash { hash } => format!("/api/v1/block/height/txhash/{}", hash),
            Method::Storage { contract, key } => {
                format!("/api/v1/storage/{}/{}", contract.to_hex(), hex::encode(key))
            }
            Method::MerkleProof { hash } => format!("/api/v1/merkleproof/{}", hash),
            Method::NodeCount => "/api/v1/node/connectioncount".to_string(),
            Method::GenerateBlockTime => "/api/v1/node/generateblocktime".to_string(),
            Method::GasPrice => "/api/v1/gasprice".to_string(),
            Method::Version => "/api/v1/version".to_string(),
            Method::NetworkId => "/api/v1/networkid".to_string(),
            Method::MempoolTxCount => "/api/v1/mempool/txcount".to_string(),
            Method::MempoolTxState { hash } => format!("/api/v1/mempool/txstate/{}", hash),
            Method::UnboundOng { address } => format!("/api/v1/unboundong/{}", address),
            Method::GrantOng { address } => format!("/api/v1/grantong/{}", address),
            Method::Allowance { asset, from, to } => {
                format!("/api/v1/allowance/{}/{}/{}", asset, from, to)
            }
        }
    }

    /// Action-specific fields of the WebSocket request object.
    pub fn ws_params(&self) -> Map<String, Value> {
        let params = match self {
            Method::RawTransaction { hash, raw } => json!({"Hash": hash.to_hex(), "Raw": raw_flag(*raw)}),
            Method::Block { by: BlockRef::Height(h), raw } => json!({"Height": h, "Raw": raw_flag(*raw)}),
            Method::Block { by: BlockRef::Hash(h), raw } => json!({"Hash": h, "Raw": raw_flag(*raw)}),
            Method::BlockTxsByHeight { height } | Method::SmartCodeEventByHeight { height } => {
                json!({"Height": height})
            }
            Method::Balance { address } | Method::UnboundOng { address } | Method::GrantOng { address } => {
                json!({"Addr": address.to_base58()})
            }
            Method::Contract { hash, raw } => json!({"Hash": hash.to_hex(), "Raw": raw_flag(*raw)}),
            Method::SmartCodeEventByHash { hash }
            | Method::BlockHeightByTxHash { hash }
            | Method::MerkleProof { hash }
            | Method::MempoolTxState { hash } => json!({"Hash": hash.to_hex()}),
            Method::Storage { contract, key } => json!({"Hash": contract.to_hex(), "Key": hex::encode(key)}),
            Method::Allowance { asset, from, to } => {
                json!({"Asset": asset.as_str(), "From": from.to_base58(), "To": to.to_base58()})
            }
            Method::BlockHeight
            | Method::NodeCount
            | Method::GenerateBlockTime
            | Method::GasPrice
            | Method::Version
            | Method::NetworkId
            | Method::MempoolTxCount => json!({}),
        };
        match params {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// One node connection able to submit transactions and answer queries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send encoded transaction bytes.
    ///
    /// `pre_execute` simulates without committing; the result is a
    /// best-effort view of current state, not a commitment. `full_response`
    /// waits for the execution event instead of returning the hash alone;
    /// it has no effect on pre-executed submissions.
    async fn submit(&self, raw: &[u8], pre_execute: bool, full_response: bool) -> Result<Envelope>;

    /// Run a read-only query.
    async fn query(&self, method: &Method) -> Result<Envelope>;

    fn kind(&self) -> TransportKind;
}

/// Display-order hash of encoded transaction bytes.
pub(crate) fn hash_of_raw(raw: &[u8]) -> Result<TxHash> {
    Transaction::deserialize(raw)?.hash()
}

/// Body of a `sendrawtransaction` request, shared by both transports.
pub(crate) fn send_raw_body(raw: &[u8], pre_execute: bool) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("Action".into(), json!("sendrawtransaction"));
    body.insert("Version".into(), json!(API_VERSION));
    body.insert("Data".into(), json!(hex::encode(raw)));
    if pre_execute {
        body.insert("PreExec".into(), json!("1"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(TransportError::ConnectionLost {
            method: "getblockheight".into(),
            id: Some("1".into())
        }
        .is_retryable());
        assert!(TransportError::Unreachable {
            url: "ws://x".into(),
            reason: "refused".into()
        }
        .is_retryable());
        assert!(!TransportError::Protocol("bad frame".into()).is_retryable());
    }

    #[test]
    fn test_rest_paths() {
        let hash = TxHash::new([0xab; 32]);
        assert_eq!(
            Method::Block { by: BlockRef::Height(12), raw: true }.rest_path(),
            "/api/v1/block/details/height/12?raw=1"
        );
        assert_eq!(
            Method::RawTransaction { hash, raw: false }.rest_path(),
            format!("/api/v1/transaction/{}?raw=0", "ab".repeat(32))
        );
        assert_eq!(
            Method::Contract { hash: Address::native(3), raw: true }.rest_path(),
            format!("/api/v1/contract/03{}?raw=1", "00".repeat(19))
        );
        assert_eq!(
            Method::Storage { contract: Address::native(1), key: vec![0x01, 0xff] }.rest_path(),
            format!("/api/v1/storage/01{}/01ff", "00".repeat(19))
        );
        assert_eq!(Method::NodeCount.rest_path(), "/api/v1/node/connectioncount");
    }

    #[test]
    fn test_ws_params() {
        let params = Method::Block { by: BlockRef::Height(5), raw: true }.ws_params();
        assert_eq!(params["Height"], json!(5));
        assert_eq!(params["Raw"], json!("1"));

        let address = Address::native(9);
        let params = Method::Balance { address }.ws_params();
        assert_eq!(params["Addr"], json!(address.to_base58()));

        assert!(Method::BlockHeight.ws_params().is_empty());
        assert_eq!(Method::BlockHeight.action(), "getblockheight");
    }

    #[test]
    fn test_send_raw_body() {
        let body = send_raw_body(&[0xde, 0xad], true);
        assert_eq!(body["Data"], json!("dead"));
        assert_eq!(body["PreExec"], json!("1"));
        assert!(!send_raw_body(&[], false).contains_key("PreExec"));
    }
}
