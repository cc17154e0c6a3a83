//! API key authorization.
//!
//! The token comes from an `Authorization: Bearer` header first, then from
//! the `token` query parameter. The resolved token is stored on the context
//! so rewritten responses embed it.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::debug;

use crate::error::ProxyError;
use crate::pipeline::{AbortReason, Processor, RequestContext};
use crate::security::{bearer_token, ApiKeySet};

/// Property recording where the accepted token came from.
pub const AUTH_SOURCE_PROPERTY: &str = "auth.source";

/// Aborts with `Unauthorized` unless a known API key is presented.
pub struct Authorize {
    keys: Arc<ApiKeySet>,
}

impl Authorize {
    pub fn new(keys: Arc<ApiKeySet>) -> Self {
        Self { keys }
    }

    fn check(&self, ctx: &mut RequestContext) {
        let (token, source) = match bearer_token(&ctx.inbound_headers) {
            Some(token) => (Some(token.to_string()), "header"),
            None => (ctx.token.clone(), "query"),
        };

        match token {
            Some(token) if self.keys.contains(&token) => {
                ctx.properties
                    .insert(AUTH_SOURCE_PROPERTY.to_string(), source.into());
                ctx.token = Some(token);
            }
            _ => {
                debug!(target_url = %ctx.target_url, "Rejected request without a valid token");
                ctx.abort(AbortReason::Unauthorized);
            }
        }
    }
}

impl Processor<RequestContext> for Authorize {
    fn name(&self) -> &'static str {
        "Authorize"
    }

    fn default_order(&self) -> i32 {
        1
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            self.check(ctx);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineContext;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn authorize(keys: &[&str]) -> Authorize {
        Authorize::new(Arc::new(ApiKeySet::new(keys.iter().copied())))
    }

    fn ctx(bearer: Option<&'static str>, query: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(b) = bearer {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(b));
        }
        RequestContext::new(headers, "https://example.com/", query.map(String::from))
    }

    #[tokio::test]
    async fn test_query_token_accepted() {
        let mut c = ctx(None, Some("k1"));
        authorize(&["k1"]).process(&mut c).await.unwrap();
        assert!(c.abort_reason().is_none());
        assert_eq!(c.token.as_deref(), Some("k1"));
        assert_eq!(c.properties[AUTH_SOURCE_PROPERTY], "query");
    }

    #[tokio::test]
    async fn test_header_takes_precedence() {
        let mut c = ctx(Some("Bearer k2"), Some("bad"));
        authorize(&["k2"]).process(&mut c).await.unwrap();
        assert!(c.abort_reason().is_none());
        assert_eq!(c.token.as_deref(), Some("k2"));
        assert_eq!(c.properties[AUTH_SOURCE_PROPERTY], "header");
    }

    #[tokio::test]
    async fn test_unknown_or_missing_token_aborts() {
        for mut c in [ctx(None, None), ctx(None, Some("nope")), ctx(Some("Bearer nope"), Some("k1"))] {
            authorize(&["k1"]).process(&mut c).await.unwrap();
            assert_eq!(c.abort_reason(), Some(AbortReason::Unauthorized));
        }
    }

    #[tokio::test]
    async fn test_empty_key_set_rejects_everything() {
        let mut c = ctx(None, Some("anything"));
        authorize(&[]).process(&mut c).await.unwrap();
        assert_eq!(c.abort_reason(), Some(AbortReason::Unauthorized));
    }
}
