//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URL schemes for each transport
//! - Validate value ranges (timeouts > 0, backoff bounds ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::ClientConfig;

/// One rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str, schemes: &[&str]) {
    match url::Url::parse(value) {
        Ok(url) if schemes.contains(&url.scheme()) => {}
        Ok(url) => errors.push(ValidationError {
            field,
            message: format!("scheme '{}' not one of {:?}", url.scheme(), schemes),
        }),
        Err(e) => errors.push(ValidationError {
            field,
            message: format!("invalid URL '{}': {}", value, e),
        }),
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError {
            field,
            message: "must be greater than 0".to_string(),
        });
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "rest.url", &config.rest.url, &["http", "https"]);
    check_positive(&mut errors, "rest.timeout_secs", config.rest.timeout_secs);
    check_positive(&mut errors, "rest.poll_interval_ms", config.rest.poll_interval_ms);

    let ws = &config.websocket;
    check_url(&mut errors, "websocket.url", &ws.url, &["ws", "wss"]);
    check_positive(&mut errors, "websocket.connect_timeout_secs", ws.connect_timeout_secs);
    check_positive(&mut errors, "websocket.request_timeout_secs", ws.request_timeout_secs);
    check_positive(&mut errors, "websocket.notification_buffer", ws.notification_buffer as u64);
    if ws.reconnect_base_ms > ws.reconnect_max_ms {
        errors.push(ValidationError {
            field: "websocket.reconnect_base_ms",
            message: format!(
                "{} exceeds reconnect_max_ms {}",
                ws.reconnect_base_ms, ws.reconnect_max_ms
            ),
        });
    }

    check_positive(&mut errors, "transaction.gas_limit", config.transaction.gas_limit);

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.observability.log_filter) {
        errors.push(ValidationError {
            field: "observability.log_filter",
            message: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
