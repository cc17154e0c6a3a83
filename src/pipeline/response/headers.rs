//! Reply header rewriting.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_ENCODING,
};
use axum::http::HeaderValue;
use futures_util::future::BoxFuture;

use crate::error::ProxyError;
use crate::pipeline::{Processor, ResponseContext};

/// Sets permissive CORS headers and forwards `Content-Encoding` only.
pub struct RewriteResponseHeaders;

impl RewriteResponseHeaders {
    fn apply(ctx: &mut ResponseContext) {
        let wildcard = HeaderValue::from_static("*");
        ctx.reply_headers
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, wildcard.clone());
        ctx.reply_headers
            .insert(ACCESS_CONTROL_ALLOW_METHODS, wildcard.clone());
        ctx.reply_headers
            .insert(ACCESS_CONTROL_ALLOW_HEADERS, wildcard);

        if let Some(encoding) = ctx.upstream_headers.get(CONTENT_ENCODING) {
            ctx.reply_headers.insert(CONTENT_ENCODING, encoding.clone());
        }
    }
}

impl Processor<ResponseContext> for RewriteResponseHeaders {
    fn name(&self) -> &'static str {
        "RewriteResponseHeaders"
    }

    fn default_order(&self) -> i32 {
        1
    }

    fn process<'a>(&'a self, ctx: &'a mut ResponseContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            Self::apply(ctx);
            Ok(())
        })
    }
}
