//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape on metrics.listen_address
//! ```
//!
//! # Design Decisions
//! - Structured fields (`namespace`, `project`, `agent`) rather than
//!   formatted messages
//! - Every HTTP request carries an `x-request-id` that appears in its span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
