//! Persistent transport over the node's WebSocket API.
//!
//! # Responsibilities
//! - Keep one connection and multiplex concurrent requests over it
//! - Correlate each response to its request by the `Id` field
//! - Fail every in-flight request when the connection drops
//! - Deliver unsolicited pushes (events, blocks) to subscribers
//!
//! # Data Flow
//! ```text
//! request() ──insert Id──▶ pending (DashMap) ──frame──▶ writer task ──▶ node
//!                              ▲                                          │
//!                              └──── remove Id ◀── reader task ◀──────────┘
//!                                                     │
//!                                     Notify/pushes ──┴──▶ tx waiters, broadcast
//! ```
//!
//! # Design Decisions
//! - Each connection has a generation number; a dying reader only fails
//!   the requests sent on its own connection
//! - Every pending entry is removed by a drop guard, so a timeout or a
//!   cancelled caller never leaks a correlation slot
//! - Reconnecting starts a fresh connection and never replays stale requests

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::crypto::Address;
use crate::error::{ClientError, Result};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::{calculate_backoff, with_timeout};
use crate::response::{Envelope, RawResponse};
use crate::transport::{hash_of_raw, send_raw_body, Method, Transport, TransportError, TransportKind, API_VERSION};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SEND_RAW_ACTION: &str = "sendrawtransaction";
const NOTIFY_ACTION: &str = "Notify";

/// Connection state of a [`WebSocketTransport`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    /// `close` was called; the transport will not connect again.
    Closed = 3,
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Which pushes the node should send on this connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// Only events from these contracts (empty means all).
    pub contracts: Vec<Address>,
    pub events: bool,
    pub json_blocks: bool,
    pub raw_blocks: bool,
    pub block_tx_hashes: bool,
}

impl SubscribeRequest {
    fn to_params(&self) -> Map<String, Value> {
        let contracts: Vec<String> = self.contracts.iter().map(Address::to_hex).collect();
        let mut params = Map::new();
        params.insert("ConstractsFilter".into(), json!(contracts));
        params.insert("SubscribeEvent".into(), json!(self.events));
        params.insert("SubscribeJsonBlock".into(), json!(self.json_blocks));
        params.insert("SubscribeRawBlock".into(), json!(self.raw_blocks));
        params.insert("SubscribeBlockTxHashs".into(), json!(self.block_tx_hashes));
        params
    }
}

/// A request awaiting its correlated response.
struct Pending {
    method: String,
    generation: u64,
    tx: oneshot::Sender<std::result::Result<RawResponse, TransportError>>,
}

/// A submission awaiting the `Notify` push for its transaction.
struct TxWaiter {
    generation: u64,
    tx: oneshot::Sender<RawResponse>,
}

/// Writer handle of one live connection.
struct Outbound {
    generation: u64,
    tx: mpsc::UnboundedSender<Message>,
}

/// Removes a map entry when dropped, whatever path the caller exits by.
struct EntryGuard<'a, V> {
    map: &'a DashMap<String, V>,
    key: String,
}

impl<V> Drop for EntryGuard<'_, V> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}

struct Shared {
    url: String,
    config: WebSocketConfig,
    state: AtomicU8,
    /// Generation of the live connection, 0 when there is none.
    live: AtomicU64,
    /// Last generation handed out.
    generation: AtomicU64,
    outbound: ArcSwapOption<Outbound>,
    pending: DashMap<String, Pending>,
    tx_waiters: DashMap<String, TxWaiter>,
    notifications: broadcast::Sender<RawResponse>,
    shutdown: Shutdown,
    connect_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::SeqCst))
    }

    /// Returns false when the transport is already closed. Closed is terminal.
    fn set_state(&self, state: ConnectionState) -> bool {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != ConnectionState::Closed as u8).then_some(state as u8)
            })
            .is_ok()
    }

    fn is_live(&self, generation: u64) -> bool {
        generation != 0 && self.live.load(Ordering::SeqCst) == generation
    }

    fn live_outbound(&self) -> Option<Arc<Outbound>> {
        self.outbound
            .load_full()
            .filter(|outbound| self.is_live(outbound.generation))
    }

    fn not_connected(&self, reason: &str) -> TransportError {
        TransportError::Unreachable {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }

    /// Route one incoming frame.
    fn dispatch(&self, text: &str) {
        let raw: RawResponse = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Ignoring unparsable WebSocket frame");
                return;
            }
        };

        if raw.action == NOTIFY_ACTION {
            let tx_hash = raw
                .result
                .get("TxHash")
                .and_then(Value::as_str)
                .map(str::to_ascii_lowercase);
            if let Some((_, waiter)) = tx_hash.and_then(|hash| self.tx_waiters.remove(&hash)) {
                let _ = waiter.tx.send(raw.clone());
            }
            let _ = self.notifications.send(raw);
            return;
        }

        match raw.id_str().and_then(|id| self.pending.remove(&id)) {
            Some((id, pending)) => {
                tracing::trace!(id = %id, method = %pending.method, "Response correlated");
                let _ = pending.tx.send(Ok(raw));
                metrics::set_pending_requests(self.pending.len());
            }
            None if raw.action == "heartbeat" => {}
            None => {
                tracing::debug!(action = %raw.action, "Uncorrelated message forwarded to subscribers");
                let _ = self.notifications.send(raw);
            }
        }
    }

    /// Fail everything sent on connection `generation`.
    fn on_disconnect(&self, generation: u64, reason: &str) {
        let was_live = self
            .live
            .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        self.outbound.rcu(|current| match current {
            Some(outbound) if outbound.generation == generation => None,
            other => other.clone(),
        });
        if was_live {
            self.set_state(ConnectionState::Disconnected);
        }

        let stale: Vec<String> = self
            .pending
            .iter()
            .filter(|entry| entry.generation == generation)
            .map(|entry| entry.key().clone())
            .collect();
        let failed = stale.len();
        for id in stale {
            if let Some((id, pending)) = self.pending.remove(&id) {
                let _ = pending.tx.send(Err(TransportError::ConnectionLost {
                    method: pending.method,
                    id: Some(id),
                }));
            }
        }
        self.tx_waiters.retain(|_, waiter| waiter.generation != generation);
        metrics::set_pending_requests(self.pending.len());

        tracing::warn!(url = %self.url, generation, failed, reason, "WebSocket disconnected");
    }
}

/// WebSocket transport with request correlation and push delivery.
///
/// Not `Clone`: share it through `Arc` (as [`crate::client::RpcClient`]
/// does). Dropping the last handle stops the background tasks.
pub struct WebSocketTransport {
    shared: Arc<Shared>,
}

impl WebSocketTransport {
    /// Create a disconnected transport. The first request connects.
    pub fn new(config: WebSocketConfig) -> Result<Self> {
        let parsed: url::Url = config
            .url
            .parse()
            .map_err(|e| ClientError::Config(format!("Invalid WebSocket URL '{}': {}", config.url, e)))?;
        let (notifications, _) = broadcast::channel(config.notification_buffer.max(1));

        Ok(Self {
            shared: Arc::new(Shared {
                url: parsed.to_string(),
                config,
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                live: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                outbound: ArcSwapOption::empty(),
                pending: DashMap::new(),
                tx_waiters: DashMap::new(),
                notifications,
                shutdown: Shutdown::new(),
                connect_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Create a transport and connect it.
    pub async fn connect(config: WebSocketConfig) -> Result<Self> {
        let transport = Self::new(config)?;
        transport.open().await?;
        Ok(transport)
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Number of requests awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Unsolicited pushes: contract events, blocks and uncorrelated replies.
    pub fn notifications(&self) -> broadcast::Receiver<RawResponse> {
        self.shared.notifications.subscribe()
    }

    /// Establish a connection unless one is already live.
    async fn open(&self) -> Result<()> {
        let shared = &self.shared;
        let _lock = shared.connect_lock.lock().await;
        if shared.state() == ConnectionState::Closed {
            return Err(shared.not_connected("transport closed").into());
        }
        if shared.live_outbound().is_some() {
            return Ok(());
        }

        shared.set_state(ConnectionState::Connecting);
        let connect_timeout = shared.config.connect_timeout();
        let attempt = with_timeout(connect_timeout, "connect", None, async {
            connect_async(shared.url.as_str())
                .await
                .map_err(|e| shared.not_connected(&e.to_string()))
        })
        .await;

        let stream = match attempt {
            Ok((stream, _)) => stream,
            Err(e) => {
                shared.set_state(ConnectionState::Disconnected);
                metrics::record_connection_attempt(false);
                tracing::warn!(url = %shared.url, error = %e, "WebSocket connect failed");
                return Err(e.into());
            }
        };
        metrics::record_connection_attempt(true);

        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        // Subscribe before publishing: a close() that lands after the state
        // check below is then seen by every task.
        let write_shutdown = shared.shutdown.subscribe();
        let read_shutdown = shared.shutdown.subscribe();
        let beat_shutdown = shared.shutdown.subscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        shared.outbound.store(Some(Arc::new(Outbound { generation, tx })));
        shared.live.store(generation, Ordering::SeqCst);
        if !shared.set_state(ConnectionState::Connected) || shared.shutdown.is_triggered() {
            // close() ran during the handshake.
            let _ = shared
                .live
                .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
            shared.outbound.rcu(|current| match current {
                Some(outbound) if outbound.generation == generation => None,
                other => other.clone(),
            });
            tracing::info!(url = %shared.url, generation, "Discarding connection opened after close");
            return Err(shared.not_connected("transport closed").into());
        }

        let (sink, stream) = stream.split();
        tokio::spawn(write_loop(sink, rx, write_shutdown));
        tokio::spawn(read_loop(Arc::clone(shared), stream, generation, read_shutdown));
        if let Some(period) = shared.config.heartbeat_interval() {
            tokio::spawn(heartbeat_loop(Arc::clone(shared), generation, period, beat_shutdown));
        }

        tracing::info!(url = %shared.url, generation, "WebSocket connected");
        Ok(())
    }

    /// Start a fresh connection, backing off between failed attempts.
    ///
    /// Requests that were pending on a previous connection have already
    /// failed with `ConnectionLost`; they are not resent.
    pub async fn reconnect(&self) -> Result<()> {
        let config = &self.shared.config;
        let attempts = config.reconnect_attempts.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let delay = calculate_backoff(attempt, config.reconnect_base_ms, config.reconnect_max_ms);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self.open().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        url = %self.shared.url,
                        attempt = attempt + 1,
                        attempts,
                        error = %e,
                        "Reconnect attempt failed"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| self.shared.not_connected("no reconnect attempts made").into()))
    }

    /// Writer of the live connection, connecting first if needed.
    async fn ensure_connected(&self) -> Result<Arc<Outbound>> {
        if let Some(outbound) = self.shared.live_outbound() {
            return Ok(outbound);
        }
        let never_connected = self.shared.generation.load(Ordering::SeqCst) == 0;
        if never_connected {
            self.open().await?;
        } else if self.shared.config.reconnect_attempts > 0 {
            self.reconnect().await?;
        } else {
            return Err(self.shared.not_connected("disconnected and reconnecting is disabled").into());
        }
        self.shared
            .live_outbound()
            .ok_or_else(|| self.shared.not_connected("connection dropped during handshake").into())
    }

    /// Send one request and wait for the response carrying its `Id`.
    async fn request(&self, method: &str, mut params: Map<String, Value>) -> Result<RawResponse> {
        let outbound = self.ensure_connected().await?;
        let shared = &self.shared;
        let id = Uuid::new_v4().to_string();
        params.insert("Action".into(), json!(method));
        params.insert("Version".into(), json!(API_VERSION));
        params.insert("Id".into(), json!(id));

        let (tx, rx) = oneshot::channel();
        shared.pending.insert(
            id.clone(),
            Pending {
                method: method.to_string(),
                generation: outbound.generation,
                tx,
            },
        );
        let _entry = EntryGuard {
            map: &shared.pending,
            key: id.clone(),
        };
        metrics::set_pending_requests(shared.pending.len());

        let connection_lost = || TransportError::ConnectionLost {
            method: method.to_string(),
            id: Some(id.clone()),
        };
        // The live check after inserting closes the gap with a reader that
        // is already draining this generation.
        if !shared.is_live(outbound.generation)
            || outbound.tx.send(Message::text(Value::Object(params).to_string())).is_err()
        {
            return Err(connection_lost().into());
        }

        let start = Instant::now();
        let result: Result<RawResponse> =
            with_timeout(shared.config.request_timeout(), method, Some(&id), async {
                match rx.await {
                    Ok(response) => response.map_err(ClientError::from),
                    Err(_) => Err(connection_lost().into()),
                }
            })
            .await;

        let elapsed = start.elapsed();
        let outcome = match &result {
            Ok(raw) => raw.outcome(),
            Err(_) => "transport_error",
        };
        metrics::record_request(TransportKind::WebSocket.as_str(), method, outcome, elapsed);
        tracing::debug!(method, id = %id, outcome, elapsed_ms = elapsed.as_millis() as u64, "WebSocket call completed");
        result
    }

    /// Ask the node to push events and/or blocks on this connection.
    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<Envelope> {
        let raw = self.request("subscribe", request.to_params()).await?;
        Ok(Envelope::from_raw(raw))
    }

    /// Close the connection and fail every pending request.
    pub fn close(&self) {
        let shared = &self.shared;
        shared.state.store(ConnectionState::Closed as u8, Ordering::SeqCst);
        shared.shutdown.trigger();
        let live = shared.live.swap(0, Ordering::SeqCst);
        shared.outbound.store(None);

        let ids: Vec<String> = shared.pending.iter().map(|entry| entry.key().clone()).collect();
        for id in ids {
            if let Some((id, pending)) = shared.pending.remove(&id) {
                let _ = pending.tx.send(Err(TransportError::ConnectionLost {
                    method: pending.method,
                    id: Some(id),
                }));
            }
        }
        shared.tx_waiters.clear();
        metrics::set_pending_requests(0);
        tracing::info!(url = %shared.url, generation = live, "WebSocket transport closed");
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.shared.shutdown.trigger();
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("url", &self.shared.url)
            .field("state", &self.state())
            .field("pending", &self.pending_requests())
            .finish()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn submit(&self, raw: &[u8], pre_execute: bool, full_response: bool) -> Result<Envelope> {
        let params = send_raw_body(raw, pre_execute);
        if pre_execute || !full_response {
            let ack = self.request(SEND_RAW_ACTION, params).await?;
            return Ok(Envelope::from_raw(ack));
        }

        // Register for the Notify before sending so a fast push is not missed.
        let hash = hash_of_raw(raw)?.to_hex();
        let outbound = self.ensure_connected().await?;
        let (tx, rx) = oneshot::channel();
        match self.shared.tx_waiters.entry(hash.clone()) {
            Entry::Occupied(_) => {
                return Err(TransportError::Protocol(format!(
                    "transaction {} is already awaiting its execution notify",
                    hash
                ))
                .into())
            }
            Entry::Vacant(slot) => {
                slot.insert(TxWaiter {
                    generation: outbound.generation,
                    tx,
                });
            }
        }
        let _waiter = EntryGuard {
            map: &self.shared.tx_waiters,
            key: hash.clone(),
        };

        let ack = Envelope::from_raw(self.request(SEND_RAW_ACTION, params).await?);
        if !ack.is_found() {
            return Ok(ack);
        }
        tracing::debug!(tx_hash = %hash, "Waiting for execution notify");

        with_timeout(self.shared.config.request_timeout(), SEND_RAW_ACTION, Some(&hash), async {
            match rx.await {
                Ok(notify) => Ok(Envelope::from_raw(notify)),
                Err(_) => Err(TransportError::ConnectionLost {
                    method: SEND_RAW_ACTION.to_string(),
                    id: None,
                }
                .into()),
            }
        })
        .await
    }

    async fn query(&self, method: &Method) -> Result<Envelope> {
        let raw = self.request(method.action(), method.ws_params()).await?;
        Ok(Envelope::from_raw(raw))
    }

    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            message = rx.recv() => match message {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        tracing::warn!(error = %e, "WebSocket write failed");
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

async fn read_loop(
    shared: Arc<Shared>,
    mut stream: SplitStream<WsStream>,
    generation: u64,
    mut shutdown: broadcast::Receiver<()>,
) {
    let reason = loop {
        tokio::select! {
            _ = shutdown.recv() => break "transport closed",
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => shared.dispatch(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => shared.dispatch(text),
                    Err(_) => tracing::warn!(len = bytes.len(), "Ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(_))) | None => break "closed by node",
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket read failed");
                    break "read error";
                }
            },
        }
    };
    shared.on_disconnect(generation, reason);
}

async fn heartbeat_loop(
    shared: Arc<Shared>,
    generation: u64,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            _ = ticker.tick() => {
                let Some(outbound) = shared.live_outbound().filter(|o| o.generation == generation) else {
                    break;
                };
                let beat = json!({"Action": "heartbeat", "Version": API_VERSION, "Id": Uuid::new_v4().to_string()});
                if outbound.tx.send(Message::text(beat.to_string())).is_err() {
                    break;
                }
                tracing::trace!(generation, "Heartbeat sent");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> WebSocketConfig {
        WebSocketConfig {
            url: url.to_string(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
            heartbeat_secs: 0,
            reconnect_attempts: 1,
            reconnect_base_ms: 10,
            reconnect_max_ms: 20,
            ..WebSocketConfig::default()
        }
    }

    #[test]
    fn test_connection_state_from_u8() {
        assert_eq!(ConnectionState::from(2), ConnectionState::Connected);
        assert_eq!(ConnectionState::from(9), ConnectionState::Disconnected);
    }

    #[test]
    fn test_subscribe_params() {
        let request = SubscribeRequest {
            contracts: vec![Address::native(3)],
            events: true,
            ..SubscribeRequest::default()
        };
        let params = request.to_params();
        assert_eq!(params["ConstractsFilter"], json!([Address::native(3).to_hex()]));
        assert_eq!(params["SubscribeEvent"], json!(true));
        assert_eq!(params["SubscribeRawBlock"], json!(false));
    }

    #[test]
    fn test_new_is_lazy() {
        let transport = WebSocketTransport::new(config("ws://127.0.0.1:9")).unwrap();
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert_eq!(transport.pending_requests(), 0);
        assert_eq!(transport.kind(), TransportKind::WebSocket);
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let transport = WebSocketTransport::new(config("ws://127.0.0.1:9")).unwrap();
        let err = transport.query(&Method::BlockHeight).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(transport.state(), ConnectionState::Disconnected);
        assert_eq!(transport.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_requests() {
        let transport = WebSocketTransport::new(config("ws://127.0.0.1:9")).unwrap();
        transport.close();
        assert_eq!(transport.state(), ConnectionState::Closed);
        let err = transport.query(&Method::BlockHeight).await.unwrap_err();
        assert!(err.to_string().contains("transport closed"));
    }

    #[test]
    fn test_dispatch_routes_by_id_and_notify() {
        let transport = WebSocketTransport::new(config("ws://127.0.0.1:9")).unwrap();
        let shared = &transport.shared;
        let mut pushes = transport.notifications();

        let (tx, mut rx) = oneshot::channel();
        shared.pending.insert(
            "req-1".into(),
            Pending {
                method: "getblockheight".into(),
                generation: 1,
                tx,
            },
        );
        shared.dispatch(r#"{"Action":"getblockheight","Error":0,"Result":10,"Id":"req-1"}"#);
        assert_eq!(rx.try_recv().unwrap().unwrap().result, json!(10));
        assert_eq!(transport.pending_requests(), 0);

        let (tx, mut waiter) = oneshot::channel();
        shared.tx_waiters.insert("abcd".into(), TxWaiter { generation: 1, tx });
        shared.dispatch(r#"{"Action":"Notify","Error":0,"Result":{"TxHash":"ABCD","State":1}}"#);
        assert_eq!(waiter.try_recv().unwrap().result["State"], json!(1));
        assert_eq!(pushes.try_recv().unwrap().action, "Notify");
    }

    #[test]
    fn test_disconnect_fails_only_its_generation() {
        let transport = WebSocketTransport::new(config("ws://127.0.0.1:9")).unwrap();
        let shared = &transport.shared;

        let (old_tx, mut old_rx) = oneshot::channel();
        let (new_tx, mut new_rx) = oneshot::channel();
        shared.pending.insert(
            "old".into(),
            Pending { method: "getblockheight".into(), generation: 1, tx: old_tx },
        );
        shared.pending.insert(
            "new".into(),
            Pending { method: "getblockheight".into(), generation: 2, tx: new_tx },
        );

        shared.on_disconnect(1, "test");
        match old_rx.try_recv().unwrap() {
            Err(TransportError::ConnectionLost { method, id }) => {
                assert_eq!(method, "getblockheight");
                assert_eq!(id.as_deref(), Some("old"));
            }
            other => panic!("expected ConnectionLost, got {:?}", other),
        }
        assert!(new_rx.try_recv().is_err());
        assert_eq!(transport.pending_requests(), 1);
    }
}
