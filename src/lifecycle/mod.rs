//! Lifecycle management for long-lived transports.
//!
//! # Data Flow
//! ```text
//! WebSocketTransport::connect
//!     → spawns writer, reader and heartbeat tasks, each subscribed to Shutdown
//!
//! WebSocketTransport::close
//!     → Shutdown::trigger → tasks exit → pending requests fail with ConnectionLost
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
