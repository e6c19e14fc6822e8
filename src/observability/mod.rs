//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline and bootstrap produce:
//!     → logging.rs (Logger capability → tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the per-request span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
