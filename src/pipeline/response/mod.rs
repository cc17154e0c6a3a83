//! Response-side processors.
//!
//! | name                     | default order | effect                               |
//! |--------------------------|---------------|--------------------------------------|
//! | `ClassifyContent`        | 0             | decode text bodies, stream the rest  |
//! | `RewriteResponseHeaders` | 1             | CORS headers, `Content-Encoding`      |
//! | `RewriteHtml`            | 2             | HTML rewriting for `text/html`        |
//! | `RewriteCss`             | 2             | CSS rewriting for `text/css`          |
//! | `RewriteJs`              | 2             | JS rewriting for JavaScript and JSON  |
//!
//! Rewriters only run on a non-empty text body whose content type matches,
//! and never fail the request: a rewrite error leaves the body untouched.

pub mod classify;
pub mod headers;
pub mod rewriters;

use std::sync::Arc;

use super::{Processor, ResponseContext};
use crate::rewrite::UrlRewriter;

pub use classify::ClassifyContent;
pub use headers::RewriteResponseHeaders;
pub use rewriters::{RewriteCss, RewriteHtml, RewriteJs};

/// Built-in response processors in registration order.
pub fn builtin(rewriter: Arc<UrlRewriter>) -> Vec<Arc<dyn Processor<ResponseContext>>> {
    vec![
        Arc::new(ClassifyContent),
        Arc::new(RewriteResponseHeaders),
        Arc::new(RewriteHtml::new(rewriter.clone())),
        Arc::new(RewriteCss::new(rewriter.clone())),
        Arc::new(RewriteJs::new(rewriter)),
    ]
}
