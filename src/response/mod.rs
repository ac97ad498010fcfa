//! Normalization of node responses.
//!
//! # Responsibilities
//! - Parse the node's `{Action, Desc, Error, Result, Version, Id}` body
//! - Classify it as found, not found, or a node error
//! - Decode the result into a method-specific type at the edge
//!
//! # Data Flow
//! ```text
//! REST body / WS frame ──serde──▶ RawResponse ──classify──▶ Envelope<Value> ──decode::<T>──▶ Envelope<T>
//! ```
//!
//! # Design Decisions
//! - "Nothing there" is `NotFound`, never an error: an empty result and
//!   the node's unknown-transaction/block/asset/contract codes map to it
//! - Every other non-zero code is a `NodeError` with the code and
//!   description kept verbatim
//! - Both transports feed the same classifier

pub mod codes;
pub mod types;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ClientError, Result};

pub use codes::describe_error_code;
pub use types::{
    Amount, Balance, BlockHeader, BlockJson, BlockTransactions, MerkleProof, NotifyEvent, PreExecResult,
    SmartContractEvent,
};

/// The node's response body before classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawResponse {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub error: i64,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RawResponse {
    /// Correlation id as text, whether the node echoed a string or a number.
    pub fn id_str(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Label of the envelope this response classifies as, without consuming it.
    pub fn outcome(&self) -> &'static str {
        match self.error {
            codes::SUCCESS if is_empty_result(&self.result) => "not_found",
            codes::SUCCESS => "found",
            code if codes::is_not_found(code) => "not_found",
            _ => "node_error",
        }
    }
}

/// An explicit error reported by the node.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{action} failed with code {code} ({desc})")]
pub struct NodeError {
    pub action: String,
    pub code: i64,
    pub desc: String,
    /// Whatever the node put in `Result` alongside the error.
    pub result: Value,
}

/// Outcome of one call, identical for every transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T = Value> {
    /// The node returned a payload.
    Found(T),
    /// The lookup succeeded but there was nothing to return.
    NotFound,
    /// The node rejected the request.
    Failed(NodeError),
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

impl Envelope<Value> {
    /// Classify a parsed node body.
    pub fn from_raw(raw: RawResponse) -> Self {
        match raw.error {
            codes::SUCCESS if is_empty_result(&raw.result) => Envelope::NotFound,
            codes::SUCCESS => Envelope::Found(raw.result),
            code if codes::is_not_found(code) => Envelope::NotFound,
            code => Envelope::Failed(NodeError {
                action: raw.action,
                code,
                desc: raw.desc,
                result: raw.result,
            }),
        }
    }

    /// Parse and classify a response body.
    pub fn from_body(method: &str, body: &str) -> Result<Self> {
        let raw: RawResponse = serde_json::from_str(body).map_err(|e| ClientError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_raw(raw))
    }

    /// Decode a found payload into `T`.
    pub fn decode<T: DeserializeOwned>(self, method: &str) -> Result<Envelope<T>> {
        match self {
            Envelope::Found(value) => serde_json::from_value(value)
                .map(Envelope::Found)
                .map_err(|e| ClientError::Decode {
                    method: method.to_string(),
                    reason: e.to_string(),
                }),
            Envelope::NotFound => Ok(Envelope::NotFound),
            Envelope::Failed(e) => Ok(Envelope::Failed(e)),
        }
    }
}

impl<T> Envelope<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Envelope::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Envelope::NotFound)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Envelope::Failed(_))
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            Envelope::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Envelope<U> {
        match self {
            Envelope::Found(value) => Envelope::Found(f(value)),
            Envelope::NotFound => Envelope::NotFound,
            Envelope::Failed(e) => Envelope::Failed(e),
        }
    }

    /// `Ok(Some)` when found, `Ok(None)` when not found, `Err` on node error.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Envelope::Found(value) => Ok(Some(value)),
            Envelope::NotFound => Ok(None),
            Envelope::Failed(e) => Err(ClientError::Node(e)),
        }
    }

    /// Short label used in logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Envelope::Found(_) => "found",
            Envelope::NotFound => "not_found",
            Envelope::Failed(_) => "node_error",
        }
    }
}
