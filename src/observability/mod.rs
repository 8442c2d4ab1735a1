//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → logging.rs (structured log events, per-request spans)
//!     → metrics.rs (request counters and latency histograms)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every span
//! - Metrics export is optional and off by default

pub mod logging;
pub mod metrics;
