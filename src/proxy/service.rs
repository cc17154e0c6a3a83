//! Proxy orchestration service.
//!
//! Runs the request pipeline, performs the outbound fetch, runs the response
//! pipeline and assembles the reply.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::Response;
use reqwest::Client;
use tracing::{debug, error};

use crate::config::PipelineConfig;
use crate::error::ProxyError;
use crate::http::response::{aborted_reply, assemble_reply};
use crate::observability::metrics;
use crate::pipeline::{
    request, response, AbortReason, Pipeline, PipelineContext, PipelineKind, RequestContext,
    ResponseContext,
};
use crate::rewrite::UrlRewriter;
use crate::security::ApiKeySet;

/// The rewriting proxy: pipelines plus the shared upstream client.
pub struct ProxyService {
    client: Client,
    request_pipeline: Pipeline<RequestContext>,
    response_pipeline: Pipeline<ResponseContext>,
}

impl ProxyService {
    pub fn new(
        client: Client,
        request_pipeline: Pipeline<RequestContext>,
        response_pipeline: Pipeline<ResponseContext>,
    ) -> Self {
        Self {
            client,
            request_pipeline,
            response_pipeline,
        }
    }

    /// Build both pipelines from the built-in processors and settings.
    pub fn with_builtin_processors(
        client: Client,
        keys: Arc<ApiKeySet>,
        rewriter: Arc<UrlRewriter>,
        settings: &PipelineConfig,
    ) -> Self {
        let request_pipeline = Pipeline::resolve(
            PipelineKind::Request,
            request::builtin(keys),
            &settings.request,
        );
        let response_pipeline = Pipeline::resolve(
            PipelineKind::Response,
            response::builtin(rewriter),
            &settings.response,
        );
        Self::new(client, request_pipeline, response_pipeline)
    }

    pub fn request_pipeline(&self) -> &Pipeline<RequestContext> {
        &self.request_pipeline
    }

    pub fn response_pipeline(&self) -> &Pipeline<ResponseContext> {
        &self.response_pipeline
    }

    /// Proxy one `GET <target_url>` on behalf of the caller.
    ///
    /// A request-side abort fails without touching the network. A
    /// response-side abort yields the upstream status with an empty body.
    pub async fn proxy(
        &self,
        inbound_headers: HeaderMap,
        target_url: String,
        token: Option<String>,
    ) -> Result<Response, ProxyError> {
        let mut req_ctx = RequestContext::new(inbound_headers, target_url, token);
        self.request_pipeline.execute(&mut req_ctx).await?;

        if let Some(reason) = req_ctx.abort_reason() {
            metrics::record_pipeline_abort(PipelineKind::Request.as_str(), reason.as_str());
            return Err(match reason {
                AbortReason::InvalidTarget => invalid_target(&req_ctx.target_url),
                AbortReason::Unauthorized | AbortReason::Suppressed => ProxyError::Unauthorized,
            });
        }

        let RequestContext {
            target_url,
            token,
            outbound,
            properties,
            ..
        } = req_ctx;
        let Some(url) = outbound.url else {
            return Err(invalid_target(&target_url));
        };

        debug!(target_url = %url, "Fetching upstream");
        let upstream = self
            .client
            .request(outbound.method, url)
            .headers(outbound.headers)
            .send()
            .await
            .map_err(|e| {
                error!(target_url = %target_url, error = %e, "Upstream fetch failed");
                ProxyError::Upstream(e)
            })?;

        let mut resp_ctx = ResponseContext::new(target_url, token, upstream);
        resp_ctx.properties = properties;
        self.response_pipeline.execute(&mut resp_ctx).await?;

        if let Some(reason) = resp_ctx.abort_reason() {
            metrics::record_pipeline_abort(PipelineKind::Response.as_str(), reason.as_str());
            return Ok(aborted_reply(resp_ctx.status));
        }

        Ok(assemble_reply(resp_ctx))
    }
}

fn invalid_target(target_url: &str) -> ProxyError {
    if target_url.is_empty() {
        ProxyError::InvalidTarget("missing target url".into())
    } else {
        ProxyError::InvalidTarget(format!("invalid target url: {target_url}"))
    }
}
