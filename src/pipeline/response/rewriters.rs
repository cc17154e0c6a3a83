//! Content rewriters wired into the response pipeline.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::observability::metrics::{self, RewriteOutcome};
use crate::pipeline::{Processor, ResponseContext};
use crate::rewrite::css::rewrite_css;
use crate::rewrite::html::rewrite_html;
use crate::rewrite::js::rewrite_js;
use crate::rewrite::{parse_base, RewriteError, RewriteScope, UrlRewriter};

/// Run `transform` over the text body and store the result if it changed.
///
/// Failures are logged and leave the body as it was.
fn apply<F>(ctx: &mut ResponseContext, rewriter: &UrlRewriter, format: &'static str, transform: F)
where
    F: FnOnce(&RewriteScope<'_>, &str) -> Result<String, RewriteError>,
{
    let Some(text) = ctx.text() else {
        return;
    };

    let result = parse_base(&ctx.target_url).and_then(|base| {
        let scope = RewriteScope::new(rewriter, &base, ctx.token.as_deref());
        transform(&scope, text)
    });

    match result {
        Ok(rewritten) if rewritten != text => {
            debug!(format, target_url = %ctx.target_url, "Rewrote body");
            metrics::record_rewrite(format, RewriteOutcome::Rewritten);
            ctx.set_text(rewritten);
        }
        Ok(_) => metrics::record_rewrite(format, RewriteOutcome::Unchanged),
        Err(e) => {
            warn!(format, target_url = %ctx.target_url, error = %e, "Rewrite failed, returning body unchanged");
            metrics::record_rewrite(format, RewriteOutcome::Failed);
        }
    }
}

/// Rewrites `text/html` documents.
pub struct RewriteHtml {
    rewriter: Arc<UrlRewriter>,
}

impl RewriteHtml {
    pub fn new(rewriter: Arc<UrlRewriter>) -> Self {
        Self { rewriter }
    }
}

impl Processor<ResponseContext> for RewriteHtml {
    fn name(&self) -> &'static str {
        "RewriteHtml"
    }

    fn default_order(&self) -> i32 {
        2
    }

    fn process<'a>(&'a self, ctx: &'a mut ResponseContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            if ctx.content_type_contains("text/html") {
                apply(ctx, &self.rewriter, "html", rewrite_html);
            }
            Ok(())
        })
    }
}

/// Rewrites `text/css` stylesheets.
pub struct RewriteCss {
    rewriter: Arc<UrlRewriter>,
}

impl RewriteCss {
    pub fn new(rewriter: Arc<UrlRewriter>) -> Self {
        Self { rewriter }
    }
}

impl Processor<ResponseContext> for RewriteCss {
    fn name(&self) -> &'static str {
        "RewriteCss"
    }

    fn default_order(&self) -> i32 {
        2
    }

    fn process<'a>(&'a self, ctx: &'a mut ResponseContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            if ctx.content_type_contains("text/css") {
                apply(ctx, &self.rewriter, "css", |scope, css| {
                    Ok(rewrite_css(scope, css).into_owned())
                });
            }
            Ok(())
        })
    }
}

/// Rewrites JavaScript and JSON bodies.
pub struct RewriteJs {
    rewriter: Arc<UrlRewriter>,
}

impl RewriteJs {
    pub fn new(rewriter: Arc<UrlRewriter>) -> Self {
        Self { rewriter }
    }
}

impl Processor<ResponseContext> for RewriteJs {
    fn name(&self) -> &'static str {
        "RewriteJs"
    }

    fn default_order(&self) -> i32 {
        2
    }

    fn process<'a>(&'a self, ctx: &'a mut ResponseContext) -> BoxFuture<'a, Result<(), ProxyError>> {
        Box::pin(async move {
            if ctx.content_type_contains("javascript") || ctx.content_type_contains("application/json") {
                apply(ctx, &self.rewriter, "js", |scope, js| {
                    Ok(rewrite_js(scope, js).into_owned())
                });
            }
            Ok(())
        })
    }
}
