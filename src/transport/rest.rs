//! Request/response transport over the node's REST API.
//!
//! Stateless per call: every request borrows a pooled connection, waits
//! for exactly one response, and releases it. A failed call never affects
//! another one.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RestConfig;
use crate::error::{ClientError, Result};
use crate::observability::metrics;
use crate::resilience::with_timeout;
use crate::response::Envelope;
use crate::transaction::TxHash;
use crate::transport::{hash_of_raw, send_raw_body, Method, Transport, TransportError, TransportKind};

const SEND_RAW_ACTION: &str = "sendrawtransaction";

/// REST transport backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
    config: RestConfig,
}

impl RestTransport {
    /// Create a transport with its own connection pool.
    pub fn new(config: RestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(config, client)
    }

    /// Create a transport sharing an existing `reqwest` client.
    pub fn with_client(config: RestConfig, client: reqwest::Client) -> Result<Self> {
        let parsed: url::Url = config
            .url
            .parse()
            .map_err(|e| ClientError::Config(format!("Invalid REST URL '{}': {}", config.url, e)))?;
        let base_url = parsed.as_str().trim_end_matches('/').to_string();

        tracing::info!(url = %base_url, timeout_secs = config.timeout_secs, "REST transport initialized");
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn unreachable(&self, e: &reqwest::Error) -> TransportError {
        TransportError::Unreachable {
            url: self.base_url.clone(),
            reason: e.to_string(),
        }
    }

    /// Send one request and classify the body.
    async fn call(&self, action: &str, request: reqwest::RequestBuilder) -> Result<Envelope> {
        let start = Instant::now();
        let result = with_timeout(self.config.timeout(), action, None, async {
            let response = request.send().await.map_err(|e| self.unreachable(&e))?;
            let status = response.status();
            let body = response.text().await.map_err(|e| self.unreachable(&e))?;
            match Envelope::from_body(action, &body) {
                Ok(envelope) => Ok(envelope),
                Err(_) if !status.is_success() => {
                    Err(TransportError::Protocol(format!("HTTP {} from {}", status, action)).into())
                }
                Err(e) => Err(e),
            }
        })
        .await;

        let elapsed = start.elapsed();
        let outcome = match &result {
            Ok(envelope) => envelope.outcome(),
            Err(_) => "transport_error",
        };
        metrics::record_request(TransportKind::Rest.as_str(), action, outcome, elapsed);
        tracing::debug!(
            method = action,
            outcome,
            elapsed_ms = elapsed.as_millis() as u64,
            "REST call completed"
        );
        result
    }

    async fn get(&self, action: &str, path: &str) -> Result<Envelope> {
        let url = format!("{}{}", self.base_url, path);
        self.call(action, self.client.get(url)).await
    }

    async fn post_raw(&self, raw: &[u8], pre_execute: bool) -> Result<Envelope> {
        let mut url = format!("{}/api/v1/transaction", self.base_url);
        if pre_execute {
            url.push_str("?preExec=1");
        }
        let body = Value::Object(send_raw_body(raw, false));
        self.call(SEND_RAW_ACTION, self.client.post(url).json(&body)).await
    }

    /// Poll the event log until the transaction's event shows up.
    async fn wait_for_event(&self, hash: TxHash) -> Result<Envelope> {
        let method = Method::SmartCodeEventByHash { hash };
        let path = method.rest_path();
        let hash_hex = hash.to_hex();

        with_timeout(self.config.timeout(), SEND_RAW_ACTION, Some(&hash_hex), async {
            loop {
                match self.get(method.action(), &path).await? {
                    Envelope::NotFound => tokio::time::sleep(self.config.poll_interval()).await,
                    other => return Ok(other),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl Transport for RestTransport {
    async fn submit(&self, raw: &[u8], pre_execute: bool, full_response: bool) -> Result<Envelope> {
        if pre_execute {
            return self.post_raw(raw, true).await;
        }

        let hash = if full_response { Some(hash_of_raw(raw)?) } else { None };
        let ack = self.post_raw(raw, false).await?;
        match (hash, ack) {
            (Some(hash), Envelope::Found(_)) => {
                tracing::debug!(tx_hash = %hash, "Waiting for execution event");
                self.wait_for_event(hash).await
            }
            (_, ack) => Ok(ack),
        }
    }

    async fn query(&self, method: &Method) -> Result<Envelope> {
        self.get(method.action(), &method.rest_path()).await
    }

    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("url", &self.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}
