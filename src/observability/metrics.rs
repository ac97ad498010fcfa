//! Metrics collection.
//!
//! # Metrics
//! - `chain_client_requests_total` (counter): calls by transport, method, outcome
//! - `chain_client_request_duration_seconds` (histogram): call latency
//! - `chain_client_pending_requests` (gauge): in-flight WebSocket requests
//! - `chain_client_ws_connections_total` (counter): connection attempts by result
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no recorder
//!   installed every call is a no-op
//! - Outcome labels match `Envelope::outcome` plus `transport_error`

use std::time::Duration;

/// Record one completed call.
pub fn record_request(transport: &'static str, method: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "chain_client_requests_total",
        "transport" => transport,
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "chain_client_request_duration_seconds",
        "transport" => transport,
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Current size of the WebSocket correlation table.
pub fn set_pending_requests(count: usize) {
    metrics::gauge!("chain_client_pending_requests").set(count as f64);
}

/// One WebSocket connection attempt.
pub fn record_connection_attempt(success: bool) {
    let result = if success { "connected" } else { "failed" };
    metrics::counter!("chain_client_ws_connections_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("rest", "getblockheight", "found", Duration::from_millis(3));
        set_pending_requests(2);
        record_connection_attempt(false);
    }
}
