//! Inbound header forwarding.

use axum::http::HeaderName;
use futures_util::future::BoxFuture;

use crate::error::ProxyError;
use crate::pipeline::{Processor, RequestContext};

/// Header name prefixes never forwarded upstream. Matched case-insensitively.
const EXCLUDED_PREFIXES: &[&str] = &[
    "host",
    "origin",
    "authorization",
    "content-length",
    "transfer-encoding",
];

/// Copies inbound headers onto the outbound request, minus the excluded set.
pub struct ForwardHeaders;

pub fn is_forwardable(name: &HeaderName) -> bool {
    // HeaderName is already lowercase
    let name = name.as_str();
    !EXCLUDED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

impl Processor<RequestContext> for ForwardHeaders {
    fn name(&self) -> &'static str {
        "ForwardHeaders"
    }

    fn default_order(&self) -> i32 {
        2
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            for (name, value) in ctx.inbound_headers.iter() {
                if is_forwardable(name) {
                    ctx.outbound.headers.append(name.clone(), value.clone());
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[tokio::test]
    async fn test_excluded_headers_are_dropped() {
        let mut inbound = HeaderMap::new();
        for (name, value) in [
            ("host", "proxy.local"),
            ("Origin", "https://proxy.local"),
            ("authorization", "Bearer k"),
            ("content-length", "0"),
            ("transfer-encoding", "chunked"),
            ("hostname-hint", "x"),
            ("accept", "text/html"),
            ("x-custom", "1"),
        ] {
            inbound.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_static(value),
            );
        }
        inbound.append("accept", HeaderValue::from_static("*/*"));

        let mut ctx = RequestContext::new(inbound, "https://example.com/", None);
        ForwardHeaders.process(&mut ctx).await.unwrap();

        let out = &ctx.outbound.headers;
        assert_eq!(out.len(), 3);
        assert_eq!(out.get_all("accept").iter().count(), 2);
        assert_eq!(out["x-custom"], "1");
        // prefix match, not exact match
        assert!(!out.contains_key("hostname-hint"));
    }
}
