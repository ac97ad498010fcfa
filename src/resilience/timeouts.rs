//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap transport calls with a deadline
//! - Turn an elapsed deadline into a classified `TransportError::Timeout`
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the inner future cancels it
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::transport::TransportError;

/// Run `fut` with a deadline, reporting `method` and `id` if it elapses.
pub async fn with_timeout<T, E, F>(after: Duration, method: &str, id: Option<&str>, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
{
    match timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(method, id, timeout_ms = after.as_millis() as u64, "Request timed out");
            Err(TransportError::Timeout {
                method: method.to_string(),
                id: id.map(str::to_string),
                after,
            }
            .into())
        }
    }
}
