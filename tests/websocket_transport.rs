//! WebSocket transport against a mock node.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use common::{start_slow_ws_node, start_ws_node, ws_config, ws_reply, ws_transport, WsReply};
use ontology_client::crypto::PrivateKey;
use ontology_client::transaction::identity::{self, OntId};
use ontology_client::transport::websocket::{ConnectionState, SubscribeRequest};
use ontology_client::{
    ClientError, Envelope, Method, RpcClient, Transaction, Transport, TransportError, WebSocketTransport,
};

/// Node that answers sendrawtransaction with the hash, then pushes its Notify.
fn committing_node(request: &Value) -> WsReply {
    match request["Action"].as_str() {
        Some("sendrawtransaction") => {
            let hash = request["Data"]
                .as_str()
                .and_then(|raw| Transaction::from_hex(raw).ok())
                .and_then(|tx| tx.hash().ok())
                .map(|hash| hash.to_hex())
                .unwrap_or_default();
            if request.get("PreExec").is_some() {
                return WsReply::Frames(vec![ws_reply(
                    request,
                    0,
                    json!({"State": 1, "Gas": 20000, "Result": "", "Notify": []}),
                )]);
            }
            WsReply::Frames(vec![
                ws_reply(request, 0, json!(hash)),
                json!({
                    "Action": "Notify",
                    "Desc": "SUCCESS",
                    "Error": 0,
                    "Result": {"TxHash": hash, "State": 1, "GasConsumed": 10000000, "Notify": []},
                    "Version": "1.0.0",
                }),
            ])
        }
        Some("gettransaction") => WsReply::Frames(vec![ws_reply(request, 44001, json!(""))]),
        Some("getblockheight") => WsReply::Frames(vec![ws_reply(request, 0, json!(88))]),
        _ => WsReply::Frames(vec![ws_reply(request, 42001, json!(""))]),
    }
}

#[tokio::test]
async fn test_query_correlated_by_id() {
    let (addr, recorded) = start_ws_node(committing_node).await;
    let transport = ws_transport(addr).await;

    let envelope = transport.query(&Method::BlockHeight).await.unwrap();
    assert_eq!(envelope, Envelope::Found(json!(88)));
    assert_eq!(transport.pending_requests(), 0);

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0]["Action"], "getblockheight");
    assert_eq!(requests[0]["Version"], "1.0.0");
    assert!(requests[0]["Id"].as_str().is_some());
}

#[tokio::test]
async fn test_out_of_order_responses() {
    // Holds the first request's reply until the second arrives.
    let held = Arc::new(std::sync::Mutex::new(None::<Value>));
    let (addr, _) = start_ws_node(move |request| {
        let mut held = held.lock().unwrap();
        match held.take() {
            None => {
                *held = Some(request.clone());
                WsReply::Ignore
            }
            Some(first) => WsReply::Frames(vec![
                ws_reply(request, 0, json!(request["Height"])),
                ws_reply(&first, 0, json!(first["Height"])),
            ]),
        }
    })
    .await;
    let transport = ws_transport(addr).await;

    let first = transport.query(&Method::BlockTxsByHeight { height: 1 });
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        transport.query(&Method::BlockTxsByHeight { height: 2 }).await
    };
    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.unwrap(), Envelope::Found(json!(1)));
    assert_eq!(second.unwrap(), Envelope::Found(json!(2)));
}

#[tokio::test]
async fn test_register_identity_full_response() {
    let (addr, _) = start_ws_node(committing_node).await;
    let client = RpcClient::new(Arc::new(ws_transport(addr).await));

    let key = PrivateKey::random();
    let public_key = key.public_key();
    let ont_id = OntId::from_public_key(&public_key);
    let tx = identity::register_identity(&ont_id, &public_key, 500, 30000, Some(public_key.address()))
        .unwrap()
        .sign(&key)
        .unwrap();

    let envelope = client.send_transaction(&tx, true).await.unwrap();
    let event = envelope.found().unwrap();
    let tx_hash = event["TxHash"].as_str().unwrap();
    assert_eq!(tx_hash.len(), 64);
    assert!(tx_hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(tx_hash, tx.hash().to_hex());
}

#[tokio::test]
async fn test_pre_exec_ddo_then_unknown_transaction() {
    let (addr, recorded) = start_ws_node(committing_node).await;
    let client = RpcClient::new(Arc::new(ws_transport(addr).await));

    let ont_id = OntId::from_public_key(&PrivateKey::random().public_key());
    let tx = identity::get_ddo(&ont_id).unwrap();
    let result = client.pre_execute(&tx).await.unwrap();
    assert!(result.found().unwrap().succeeded());

    let lookup = client.get_raw_transaction(tx.hash().unwrap()).await.unwrap();
    assert!(lookup.is_not_found());

    let requests = recorded.lock().unwrap();
    assert_eq!(requests[0]["PreExec"], "1");
    assert_eq!(requests[1]["Action"], "gettransaction");
}

#[tokio::test]
async fn test_disconnect_fails_pending_request() {
    let (addr, _) = start_ws_node(|_| WsReply::Disconnect).await;
    let transport = ws_transport(addr).await;

    let err = transport.query(&Method::BlockHeight).await.unwrap_err();
    match err {
        ClientError::Transport(TransportError::ConnectionLost { method, id }) => {
            assert_eq!(method, "getblockheight");
            assert!(id.is_some());
        }
        other => panic!("expected ConnectionLost, got {:?}", other),
    }
    assert_eq!(transport.pending_requests(), 0);
}

#[tokio::test]
async fn test_timeout_releases_pending_entry() {
    let (addr, _) = start_ws_node(|_| WsReply::Ignore).await;
    let mut config = ws_config(addr);
    config.request_timeout_secs = 1;
    let transport = WebSocketTransport::connect(config).await.unwrap();

    let err = transport.query(&Method::BlockHeight).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::Timeout { .. })));
    assert_eq!(transport.pending_requests(), 0);
    assert_eq!(transport.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let (addr, _) = start_ws_node(|request| match request["Action"].as_str() {
        Some("getversion") => WsReply::Disconnect,
        _ => WsReply::Frames(vec![ws_reply(request, 0, json!(5))]),
    })
    .await;
    let transport = ws_transport(addr).await;

    assert!(transport.query(&Method::Version).await.is_err());
    tokio::time::sleep(Duration::from_millis(50)).await;
    let envelope = transport.query(&Method::NodeCount).await.unwrap();
    assert_eq!(envelope, Envelope::Found(json!(5)));
}

#[tokio::test]
async fn test_close_is_terminal() {
    let (addr, _) = start_ws_node(committing_node).await;
    let transport = ws_transport(addr).await;
    assert_eq!(transport.state(), ConnectionState::Connected);

    transport.close();
    assert_eq!(transport.state(), ConnectionState::Closed);
    let err = transport.query(&Method::BlockHeight).await.unwrap_err();
    assert!(err.to_string().contains("transport closed"));
}

#[tokio::test]
async fn test_close_during_handshake_is_terminal() {
    let (addr, recorded) = start_slow_ws_node(Duration::from_millis(300), |request| {
        WsReply::Frames(vec![ws_reply(request, 0, json!(7))])
    })
    .await;
    let transport = Arc::new(WebSocketTransport::new(ws_config(addr)).unwrap());

    let in_flight = {
        let transport = transport.clone();
        tokio::spawn(async move { transport.query(&Method::BlockHeight).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    transport.close();

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(err.to_string().contains("transport closed"));
    let err = transport.query(&Method::BlockHeight).await.unwrap_err();
    assert!(err.to_string().contains("transport closed"));
    assert_eq!(transport.state(), ConnectionState::Closed);
    assert_eq!(transport.pending_requests(), 0);
    assert!(recorded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_same_transaction_awaited_once() {
    // Acknowledges submissions but never pushes the Notify.
    let (addr, _) = start_ws_node(|request| match request["Action"].as_str() {
        Some("sendrawtransaction") => WsReply::Frames(vec![ws_reply(request, 0, json!("accepted"))]),
        _ => WsReply::Ignore,
    })
    .await;
    let mut config = ws_config(addr);
    config.request_timeout_secs = 1;
    let transport = WebSocketTransport::connect(config).await.unwrap();

    let key = PrivateKey::random();
    let public_key = key.public_key();
    let ont_id = OntId::from_public_key(&public_key);
    let raw = identity::register_identity(&ont_id, &public_key, 500, 30000, Some(public_key.address()))
        .unwrap()
        .sign(&key)
        .unwrap()
        .serialize()
        .unwrap();

    let first = transport.submit(&raw, false, true);
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        transport.submit(&raw, false, true).await
    };
    let (first, second) = tokio::join!(first, second);
    assert!(matches!(first.unwrap_err(), ClientError::Transport(TransportError::Timeout { .. })));
    assert!(matches!(second.unwrap_err(), ClientError::Transport(TransportError::Protocol(_))));

    // The finished wait released its slot.
    let again = transport.submit(&raw, false, true).await.unwrap_err();
    assert!(matches!(again, ClientError::Transport(TransportError::Timeout { .. })));
}

#[tokio::test]
async fn test_subscription_pushes_reach_subscribers() {
    let (addr, _) = start_ws_node(|request| match request["Action"].as_str() {
        Some("subscribe") => WsReply::Frames(vec![
            ws_reply(request, 0, json!({"SubscribeEvent": true})),
            json!({"Action": "Notify", "Error": 0, "Result": {"TxHash": "ab", "State": 1}}),
        ]),
        _ => WsReply::Ignore,
    })
    .await;
    let transport = ws_transport(addr).await;
    let mut pushes = transport.notifications();

    let request = SubscribeRequest {
        events: true,
        ..SubscribeRequest::default()
    };
    assert!(transport.subscribe(&request).await.unwrap().is_found());

    let push = tokio::time::timeout(Duration::from_secs(2), pushes.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(push.action, "Notify");
    assert_eq!(push.result["TxHash"], "ab");
}
