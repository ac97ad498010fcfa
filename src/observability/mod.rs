//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Transports and client produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//! ```
//!
//! # Design Decisions
//! - Structured fields (method, id, url, elapsed) on every transport event
//! - Key material is never logged; addresses and public keys are
//! - The library never installs a metrics exporter; the host application does

pub mod logging;
pub mod metrics;
