//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! GET /web:
//!     → pipeline Authorize processor (api_keys.rs), always on
//!
//! GET /proxy:
//!     → access_control.rs middleware (api_keys.rs), only with require_auth
//! ```
//!
//! # Design Decisions
//! - Fail closed: an empty key set authorizes nothing
//! - Keys are loaded once at startup and never change
//! - Token comparison is exact and case-sensitive

pub mod access_control;
pub mod api_keys;

pub use access_control::{access_control_middleware, AccessControlState};
pub use api_keys::{bearer_token, ApiKeySet};
