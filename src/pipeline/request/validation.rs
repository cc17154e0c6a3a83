//! Target URL validation.

use futures_util::future::BoxFuture;
use url::Url;

use crate::error::ProxyError;
use crate::pipeline::{AbortReason, Processor, RequestContext};

/// Aborts with `InvalidTarget` unless the target is an absolute http(s) URL.
pub struct Validate;

impl Validate {
    fn check(ctx: &mut RequestContext) {
        if ctx.target_url.is_empty() {
            ctx.abort(AbortReason::InvalidTarget);
            return;
        }
        match Url::parse(&ctx.target_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                ctx.outbound.url = Some(url);
            }
            _ => ctx.abort(AbortReason::InvalidTarget),
        }
    }
}

impl Processor<RequestContext> for Validate {
    fn name(&self) -> &'static str {
        "Validate"
    }

    fn default_order(&self) -> i32 {
        0
    }

    fn process<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            Self::check(ctx);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineContext;
    use axum::http::HeaderMap;

    async fn validate(target: &str) -> RequestContext {
        let mut ctx = RequestContext::new(HeaderMap::new(), target, None);
        Validate.process(&mut ctx).await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_http_and_https_accepted() {
        for target in ["http://example.com/", "HTTPS://example.com/a?b=c"] {
            let ctx = validate(target).await;
            assert!(ctx.abort_reason().is_none(), "{target}");
            assert!(ctx.outbound.url.is_some());
        }
    }

    #[tokio::test]
    async fn test_invalid_targets_abort() {
        for target in ["", "example.com", "ftp://example.com/x", "javascript:alert(1)", "/relative"] {
            let ctx = validate(target).await;
            assert_eq!(ctx.abort_reason(), Some(AbortReason::InvalidTarget), "{target:?}");
        }
    }
}
