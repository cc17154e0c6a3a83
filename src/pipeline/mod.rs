//! Request and response processor pipelines.
//!
//! # Data Flow
//! ```text
//! Inbound call → RequestContext
//!     → request processors in resolved order (validate, authorize, headers)
//!     → stop on abort or error
//! Upstream response → ResponseContext
//!     → response processors in resolved order (classify, headers, rewriters)
//!     → stop on abort or error
//! ```
//!
//! # Design Decisions
//! - Order is resolved once at startup from each processor's default order
//!   and the configured overrides; ties keep registration order
//! - An allow-list, when non-empty, restricts which processors run
//! - Unknown names in configuration are ignored
//! - Processors are shared across requests and hold no per-request state

pub mod context;
pub mod request;
pub mod response;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::config::PipelineSettings;
use crate::error::ProxyError;

pub use context::{AbortReason, PipelineContext, RequestContext, ResponseBody, ResponseContext};

/// A single pipeline stage.
pub trait Processor<C>: Send + Sync {
    /// Name used for configuration and logging.
    fn name(&self) -> &'static str;

    /// Position used when configuration gives no override. Lower runs first.
    fn default_order(&self) -> i32;

    /// Inspect or mutate the context. Call `abort` on it to stop the pipeline.
    fn process<'a>(&'a self, ctx: &'a mut C) -> BoxFuture<'a, Result<(), ProxyError>>;
}

/// Which side of the proxy a pipeline runs on. Used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Request,
    Response,
}

impl PipelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Request => "request",
            PipelineKind::Response => "response",
        }
    }
}

/// An ordered, filtered list of processors.
pub struct Pipeline<C> {
    kind: PipelineKind,
    processors: Vec<Arc<dyn Processor<C>>>,
}

impl<C: PipelineContext> Pipeline<C> {
    /// Resolve the effective processor list.
    ///
    /// Effective order is the configured override if present, otherwise the
    /// processor's default. Processors are dropped when an allow-list is set
    /// and does not name them, or when their settings disable them.
    pub fn resolve(
        kind: PipelineKind,
        registered: Vec<Arc<dyn Processor<C>>>,
        settings: &PipelineSettings,
    ) -> Self {
        let mut ordered: Vec<(i32, Arc<dyn Processor<C>>)> = registered
            .into_iter()
            .filter(|p| {
                settings.enabled_processors.is_empty()
                    || settings.enabled_processors.iter().any(|n| n == p.name())
            })
            .filter(|p| settings.processors.get(p.name()).is_none_or(|s| s.enabled))
            .map(|p| {
                let order = settings
                    .processors
                    .get(p.name())
                    .and_then(|s| s.order)
                    .unwrap_or_else(|| p.default_order());
                (order, p)
            })
            .collect();

        // stable: equal orders keep registration order
        ordered.sort_by_key(|(order, _)| *order);

        let pipeline = Self {
            kind,
            processors: ordered.into_iter().map(|(_, p)| p).collect(),
        };
        info!(
            pipeline = kind.as_str(),
            processors = ?pipeline.names(),
            "Pipeline resolved"
        );
        pipeline
    }

    /// Processor names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Run every processor in order, stopping after the first abort.
    ///
    /// Errors are logged and propagated; later processors do not run.
    pub async fn execute(&self, ctx: &mut C) -> Result<(), ProxyError> {
        for processor in &self.processors {
            if let Err(e) = processor.process(ctx).await {
                warn!(
                    pipeline = self.kind.as_str(),
                    processor = processor.name(),
                    error = %e,
                    "Processor failed"
                );
                return Err(e);
            }
            if let Some(reason) = ctx.abort_reason() {
                debug!(
                    pipeline = self.kind.as_str(),
                    processor = processor.name(),
                    reason = reason.as_str(),
                    "Pipeline aborted"
                );
                break;
            }
        }
        Ok(())
    }
}
