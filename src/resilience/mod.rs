//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Transport call:
//!     → timeouts.rs (every call has a deadline)
//!
//! WebSocket disconnect:
//!     → backoff.rs (delay between reconnect attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Calls are never retried automatically; errors are classified with
//!   `is_retryable` and the caller decides
//! - Only connection establishment backs off and retries

pub mod backoff;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use timeouts::with_timeout;
