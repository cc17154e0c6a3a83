//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! signals.rs: SIGTERM / Ctrl+C
//!     → shutdown.rs: Shutdown::trigger
//!     → HttpServer::run stops accepting, drains in-flight requests, returns
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; any number of tasks may subscribe
//! - In-flight requests finish; no forced deadline beyond the request timeout

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
