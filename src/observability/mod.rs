//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! server, pipelines, rewriters produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID from the HTTP layer is attached to the request span
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
