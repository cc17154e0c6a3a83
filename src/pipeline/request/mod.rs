//! Request-side processors.
//!
//! | name             | default order | effect                                   |
//! |------------------|---------------|------------------------------------------|
//! | `Validate`       | 0             | abort `InvalidTarget` on a bad target URL |
//! | `Authorize`      | 1             | abort `Unauthorized` on a bad token       |
//! | `ForwardHeaders` | 2             | copy inbound headers to the outbound call |

pub mod authorization;
pub mod headers;
pub mod validation;

use std::sync::Arc;

use super::{Processor, RequestContext};
use crate::security::ApiKeySet;

pub use authorization::Authorize;
pub use headers::ForwardHeaders;
pub use validation::Validate;

/// Built-in request processors in registration order.
pub fn builtin(keys: Arc<ApiKeySet>) -> Vec<Arc<dyn Processor<RequestContext>>> {
    vec![
        Arc::new(Validate),
        Arc::new(Authorize::new(keys)),
        Arc::new(ForwardHeaders),
    ]
}
