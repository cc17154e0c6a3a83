//! Proxy orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! GET /web?url=…&token=…
//!     → service.rs
//!         → request pipeline (validate, authorize, headers)
//!         → upstream.rs (shared reqwest client, one GET)
//!         → response pipeline (classify, headers, rewriters)
//!         → http::response (reply assembly)
//!
//! GET /proxy?url=…
//!     → passthrough.rs (no pipelines, body streamed unchanged)
//! ```
//!
//! # Design Decisions
//! - One outbound call per inbound request; no retries
//! - Dropping the handler future cancels the outbound call
//! - Both services share one connection pool

pub mod passthrough;
pub mod service;
pub mod upstream;

pub use passthrough::PassthroughService;
pub use service::ProxyService;
pub use upstream::build_client;
