//! Mock nodes shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use ontology_client::config::{RestConfig, WebSocketConfig};
use ontology_client::{RestTransport, WebSocketTransport};

/// One HTTP request as the mock node saw it.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Requests recorded by a mock node, in arrival order.
pub type Recorded<T> = Arc<Mutex<Vec<T>>>;

/// Node response body in the node's wire shape.
pub fn node_body(action: &str, error: i64, result: Value) -> String {
    let desc = if error == 0 { "SUCCESS" } else { "ERROR" };
    json!({
        "Action": action,
        "Desc": desc,
        "Error": error,
        "Result": result,
        "Version": "1.0.0",
    })
    .to_string()
}

async fn read_http_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(MockRequest { method, path, body })
}

/// Start a mock REST node. `handler` maps each request to a status and body;
/// a `None` answer leaves the connection hanging.
pub async fn start_rest_node<F>(handler: F) -> (SocketAddr, Recorded<MockRequest>)
where
    F: Fn(&MockRequest) -> Option<(u16, String)> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    let recorded: Recorded<MockRequest> = Arc::new(Mutex::new(Vec::new()));
    let log = recorded.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let Some(request) = read_http_request(&mut socket).await else {
                    return;
                };
                log.lock().unwrap().push(request.clone());
                let Some((status, body)) = handler(&request) else {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    return;
                };
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// What the mock WebSocket node does with one request.
pub enum WsReply {
    /// Send these frames, in order.
    Frames(Vec<Value>),
    /// Never answer.
    Ignore,
    /// Drop the connection.
    Disconnect,
}

/// Reply frame echoing the request's `Id`.
pub fn ws_reply(request: &Value, error: i64, result: Value) -> Value {
    let desc = if error == 0 { "SUCCESS" } else { "ERROR" };
    json!({
        "Action": request["Action"],
        "Desc": desc,
        "Error": error,
        "Result": result,
        "Version": "1.0.0",
        "Id": request["Id"],
    })
}

/// Start a mock WebSocket node. Every connection shares `handler`.
pub async fn start_ws_node<F>(handler: F) -> (SocketAddr, Recorded<Value>)
where
    F: Fn(&Value) -> WsReply + Send + Sync + 'static,
{
    start_slow_ws_node(Duration::ZERO, handler).await
}

/// Like [`start_ws_node`], but holds every handshake for `handshake_delay`.
pub async fn start_slow_ws_node<F>(handshake_delay: Duration, handler: F) -> (SocketAddr, Recorded<Value>)
where
    F: Fn(&Value) -> WsReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    let recorded: Recorded<Value> = Arc::new(Mutex::new(Vec::new()));
    let log = recorded.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let log = log.clone();
            tokio::spawn(async move {
                if !handshake_delay.is_zero() {
                    tokio::time::sleep(handshake_delay).await;
                }
                let Ok(ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                let (mut sink, mut stream) = ws.split();
                while let Some(Ok(message)) = stream.next().await {
                    let Ok(text) = message.to_text() else { continue };
                    let Ok(request) = serde_json::from_str::<Value>(text) else {
                        continue;
                    };
                    log.lock().unwrap().push(request.clone());
                    match handler(&request) {
                        WsReply::Frames(frames) => {
                            for frame in frames {
                                if sink.send(Message::text(frame.to_string())).await.is_err() {
                                    return;
                                }
                            }
                        }
                        WsReply::Ignore => {}
                        WsReply::Disconnect => return,
                    }
                }
            });
        }
    });

    (addr, recorded)
}

pub fn rest_transport(addr: SocketAddr) -> RestTransport {
    let config = RestConfig {
        url: format!("http://{}", addr),
        timeout_secs: 2,
        poll_interval_ms: 50,
        ..RestConfig::default()
    };
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    RestTransport::with_client(config, client).unwrap()
}

pub fn ws_config(addr: SocketAddr) -> WebSocketConfig {
    WebSocketConfig {
        url: format!("ws://{}", addr),
        connect_timeout_secs: 2,
        request_timeout_secs: 2,
        heartbeat_secs: 0,
        reconnect_attempts: 2,
        reconnect_base_ms: 10,
        reconnect_max_ms: 50,
        ..WebSocketConfig::default()
    }
}

pub async fn ws_transport(addr: SocketAddr) -> WebSocketTransport {
    WebSocketTransport::connect(ws_config(addr)).await.unwrap()
}
