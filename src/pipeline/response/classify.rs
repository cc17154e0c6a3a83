//! Content classification.
//!
//! Text content types are read fully and decoded; everything else stays an
//! opaque stream.

use axum::http::header::CONTENT_ENCODING;
use futures_util::future::BoxFuture;
use tracing::debug;

use crate::error::ProxyError;
use crate::pipeline::{Processor, ResponseBody, ResponseContext};

/// Substrings of content types decoded as text.
const TEXT_TYPES: &[&str] = &[
    "text/html",
    "text/plain",
    "text/css",
    "application/json",
    "application/javascript",
    "text/javascript",
    "application/xml",
    "text/xml",
];

pub fn is_text(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    TEXT_TYPES.iter().any(|t| content_type.contains(t))
}

/// Whether the body still carries a content coding the client left undone.
fn still_encoded(ctx: &ResponseContext) -> bool {
    ctx.upstream_headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("identity"))
}

/// Populates exactly one of the text or stream body.
pub struct ClassifyContent;

impl ClassifyContent {
    async fn classify(ctx: &mut ResponseContext) -> Result<(), ProxyError> {
        if !matches!(ctx.body, ResponseBody::Unclassified) {
            return Ok(());
        }

        if ctx.content_type.as_deref().is_some_and(is_text) && !still_encoded(ctx) {
            let raw = ctx.take_body_bytes().await?;
            // BOM wins over the UTF-8 default; malformed input is replaced
            let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(&raw);
            debug!(
                target_url = %ctx.target_url,
                encoding = encoding.name(),
                bytes = raw.len(),
                had_errors,
                "Classified body as text"
            );
            ctx.body = ResponseBody::Text {
                text: text.into_owned(),
                raw,
            };
        } else if let Some(upstream) = ctx.upstream.take() {
            ctx.body = ResponseBody::Stream(upstream);
        }
        Ok(())
    }
}

impl Processor<ResponseContext> for ClassifyContent {
    fn name(&self) -> &'static str {
        "ClassifyContent"
    }

    fn default_order(&self) -> i32 {
        0
    }

    fn process<'a>(&'a self, ctx: &'a mut ResponseContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(Self::classify(ctx))
    }
}
