//! Request dispatch: normalize, route, respond.
//!
//! # State Machine
//! ```text
//! Started ─▶ Normalizing ─┬─▶ NormalizeFailed ──────────────┐
//!                         └─▶ Normalized ─▶ Routing ─┬─▶ RouteFailed ─┤
//!                                                    └─▶ RouteSucceeded ┤
//!                                                                       ▼
//!                                              abort checkpoint ─┬─▶ (aborted) warn, no write
//!                                                                └─▶ Responding ─▶ Done
//! ```
//!
//! # Design Decisions
//! - Every step returns `Result<_, PipelineError>`; nothing escapes [`dispatch`]
//! - The abort observer only flips a flag; decisions happen at the checkpoint
//! - The router's future is not cancelled on abort, its outcome is discarded
//! - Router panics are caught and classified like returned errors

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::http::error::{BoxError, PipelineError};
use crate::http::request::{self, NormalizedRequest};
use crate::http::response;
use crate::net::abort::AbortSignal;
use crate::net::transport::{TransportRequest, TransportResponse};
use crate::observability::logging::Dependencies;
use crate::observability::metrics;
use crate::validators::is_positive_number;

/// Content type of a successful response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseType {
    #[default]
    Json,
    Text,
}

impl ResponseType {
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseType::Json => "application/json",
            ResponseType::Text => "text/plain; charset=utf-8",
        }
    }
}

impl From<&str> for ResponseType {
    /// Anything other than `text` is JSON.
    fn from(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("text") {
            ResponseType::Text
        } else {
            ResponseType::Json
        }
    }
}

/// What a router returns on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterOutcome {
    pub status: StatusCode,
    /// Response body; empty when `None`.
    pub message: Option<String>,
    pub response_type: ResponseType,
}

/// A numeric-string status that is not a valid HTTP status code.
#[derive(Debug, Error)]
#[error("`{0}` is not a valid HTTP status code")]
pub struct InvalidStatus(pub String);

impl RouterOutcome {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
            response_type: ResponseType::Json,
        }
    }

    /// Outcome from a status given as a numeric string, e.g. `"201"`.
    pub fn from_raw_status(raw: &str) -> Result<Self, InvalidStatus> {
        let raw = raw.trim();
        if !is_positive_number(Some(raw)) {
            return Err(InvalidStatus(raw.to_string()));
        }
        let status = raw
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| InvalidStatus(raw.to_string()))?;
        Ok(Self::new(status))
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

pub type RouteResult = Result<RouterOutcome, BoxError>;

/// The single user-supplied routing function.
///
/// Implemented for any `Fn(Arc<D>, NormalizedRequest) -> impl Future<Output = RouteResult>`.
pub trait Router<D>: Send + Sync + 'static {
    fn route(&self, deps: Arc<D>, request: NormalizedRequest) -> BoxFuture<'static, RouteResult>;
}

impl<D, F, Fut> Router<D> for F
where
    F: Fn(Arc<D>, NormalizedRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = RouteResult> + Send + 'static,
{
    fn route(&self, deps: Arc<D>, request: NormalizedRequest) -> BoxFuture<'static, RouteResult> {
        Box::pin(self(deps, request))
    }
}

/// A router that panicked instead of returning.
#[derive(Debug, Error)]
#[error("router panicked: {0}")]
pub struct RouterPanic(pub String);

/// Normalize and route, without touching the response.
pub async fn process<D, R, T>(
    deps: &Arc<D>,
    router: &R,
    request: &mut T,
    abort: &AbortSignal,
) -> Result<RouterOutcome, PipelineError>
where
    D: Dependencies,
    R: Router<D> + ?Sized,
    T: TransportRequest + ?Sized,
{
    let normalized = request::normalize(request, abort).await?;
    deps.logger().debug(&normalized.describe());

    let routed = AssertUnwindSafe(router.route(Arc::clone(deps), normalized))
        .catch_unwind()
        .await;

    match routed {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(PipelineError::router_failure(e)),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(PipelineError::router_failure(RouterPanic(reason)))
        }
    }
}

/// Run one request through the pipeline and write exactly one response,
/// unless the connection aborted first.
pub async fn dispatch<D, R, Req, Res>(
    deps: Arc<D>,
    router: Arc<R>,
    mut request: Req,
    mut response: Res,
) where
    D: Dependencies,
    R: Router<D> + ?Sized,
    Req: TransportRequest,
    Res: TransportResponse,
{
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", request_id = %request_id);

    async move {
        let start = Instant::now();
        let method = method_label(request.method());
        let abort = response.on_aborted();

        let outcome = process(&deps, router.as_ref(), &mut request, &abort).await;

        if abort.is_aborted() {
            deps.logger().warn("Aborted response, halting execution");
            metrics::record_aborted();
            return;
        }

        let status = match outcome {
            Ok(outcome) => response::write_outcome(&mut response, outcome),
            Err(err) => {
                metrics::record_error(classify(&err));
                response::write_error(&mut response, deps.logger(), err)
            }
        };
        metrics::record_request(method, status.as_u16(), start);
    }
    .instrument(span)
    .await
}

/// Label for the `method` metric dimension. Rejected tokens share one label
/// so clients cannot mint new series.
pub fn method_label(raw: &str) -> &'static str {
    request::parse_method(raw)
        .map(|m| m.as_str())
        .unwrap_or(INVALID_METHOD_LABEL)
}

const INVALID_METHOD_LABEL: &str = "INVALID";

fn classify(err: &PipelineError) -> &'static str {
    use crate::http::error::{
        INVALID_HTTP_METHOD_MESSAGE, MALFORMED_BODY_MESSAGE, MALFORMED_QUERY_PARAMS_MESSAGE,
    };
    match err.resolved_message() {
        INVALID_HTTP_METHOD_MESSAGE => "invalid_method",
        MALFORMED_QUERY_PARAMS_MESSAGE => "malformed_query",
        MALFORMED_BODY_MESSAGE => "malformed_body",
        _ => "router_failure",
    }
}
