//! Uniform pipeline failure and its factory.
//!
//! Every failure path (bad method, bad query, bad body, router failure,
//! listen failure) is expressed as one [`PipelineError`]. Only `status` and
//! `message` ever reach the client; `cause` is for the log line.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

/// Any error value a router (or the engine) may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const CLIENT_ERROR_STATUS: StatusCode = StatusCode::BAD_REQUEST;
pub const NOT_FOUND_STATUS: StatusCode = StatusCode::NOT_FOUND;
pub const UNPROCESSABLE_ENTITY_STATUS: StatusCode = StatusCode::UNPROCESSABLE_ENTITY;
pub const SERVER_SIDE_ERROR_STATUS: StatusCode = StatusCode::INTERNAL_SERVER_ERROR;

pub const INVALID_HTTP_METHOD_MESSAGE: &str = "Invalid HTTP Method";
pub const INVALID_ROUTE_MESSAGE: &str = "The requested route is not available";
pub const MALFORMED_QUERY_PARAMS_MESSAGE: &str = "Query params are not formatted appropriately";
pub const MALFORMED_BODY_MESSAGE: &str = "Request Body is invalid or malformed";
pub const SERVER_LISTEN_ERROR_MESSAGE: &str = "Initialisation of server failed";
pub const SERVER_SIDE_ERROR_MESSAGE: &str = "Unhandled Server Error";

/// Cause synthesized from the message when none is supplied.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Origin(pub String);

/// The single failure shape used across the pipeline.
#[derive(Debug)]
pub struct PipelineError {
    /// Status sent to the client; [`SERVER_SIDE_ERROR_STATUS`] when absent.
    pub status: Option<StatusCode>,
    /// Message sent to the client; [`SERVER_SIDE_ERROR_MESSAGE`] when absent.
    pub message: Option<String>,
    /// Underlying cause. Logged, never written to the wire.
    pub cause: Option<BoxError>,
    backtrace: Backtrace,
}

/// Build a [`PipelineError`]. Without a `cause`, one is made from `message`.
pub fn make_error(
    status: StatusCode,
    message: impl Into<String>,
    cause: Option<BoxError>,
) -> PipelineError {
    let message = message.into();
    let cause = cause.unwrap_or_else(|| Box::new(Origin(message.clone())));
    PipelineError {
        status: Some(status),
        message: Some(message),
        cause: Some(cause),
        backtrace: Backtrace::capture(),
    }
}

impl PipelineError {
    /// Wrap a bare cause with no status or message; both fall back to the defaults.
    pub fn from_cause(cause: impl Into<BoxError>) -> Self {
        Self {
            status: None,
            message: None,
            cause: Some(cause.into()),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn invalid_method() -> Self {
        make_error(UNPROCESSABLE_ENTITY_STATUS, INVALID_HTTP_METHOD_MESSAGE, None)
    }

    pub fn malformed_query(cause: impl Into<BoxError>) -> Self {
        make_error(CLIENT_ERROR_STATUS, MALFORMED_QUERY_PARAMS_MESSAGE, Some(cause.into()))
    }

    pub fn malformed_body(cause: impl Into<BoxError>) -> Self {
        make_error(UNPROCESSABLE_ENTITY_STATUS, MALFORMED_BODY_MESSAGE, Some(cause.into()))
    }

    /// The router's own error is kept as cause only; the client sees the generic pair.
    pub fn router_failure(cause: impl Into<BoxError>) -> Self {
        make_error(SERVER_SIDE_ERROR_STATUS, SERVER_SIDE_ERROR_MESSAGE, Some(cause.into()))
    }

    pub fn listen_failure(cause: impl Into<BoxError>) -> Self {
        make_error(SERVER_SIDE_ERROR_STATUS, SERVER_LISTEN_ERROR_MESSAGE, Some(cause.into()))
    }

    /// Status with the server-error fallback applied.
    pub fn resolved_status(&self) -> StatusCode {
        self.status.unwrap_or(SERVER_SIDE_ERROR_STATUS)
    }

    /// Message with the server-error fallback applied.
    pub fn resolved_message(&self) -> &str {
        self.message.as_deref().unwrap_or(SERVER_SIDE_ERROR_MESSAGE)
    }

    /// Cause chain plus the captured backtrace, for logs only.
    pub fn stack(&self) -> String {
        let Some(cause) = self.cause.as_deref() else {
            return "undefined".to_string();
        };

        let mut out = cause.to_string();
        let mut source = cause.source();
        while let Some(inner) = source {
            out.push_str(" <- ");
            out.push_str(&inner.to_string());
            source = inner.source();
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            out.push('\n');
            out.push_str(&self.backtrace.to_string());
        }
        out
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resolved_status().as_u16(), self.resolved_message())
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn make_error_synthesizes_cause_from_message() {
        let err = make_error(StatusCode::IM_A_TEAPOT, "short and stout", None);
        assert_eq!(err.status, Some(StatusCode::IM_A_TEAPOT));
        assert_eq!(err.message.as_deref(), Some("short and stout"));
        assert_eq!(err.cause.as_ref().unwrap().to_string(), "short and stout");
    }

    #[test]
    fn make_error_keeps_given_cause() {
        let cause: BoxError = "disk on fire".into();
        let err = make_error(StatusCode::BAD_REQUEST, "nope", Some(cause));
        assert_eq!(err.cause.as_ref().unwrap().to_string(), "disk on fire");
        assert_eq!(err.source().unwrap().to_string(), "disk on fire");
    }

    #[test]
    fn missing_fields_fall_back_to_server_error() {
        let err = PipelineError::from_cause("boom");
        assert_eq!(err.resolved_status(), SERVER_SIDE_ERROR_STATUS);
        assert_eq!(err.resolved_message(), SERVER_SIDE_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "500 Unhandled Server Error");
    }

    #[test]
    fn classifications() {
        let err = PipelineError::invalid_method();
        assert_eq!(err.resolved_status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.resolved_message(), INVALID_HTTP_METHOD_MESSAGE);

        let err = PipelineError::router_failure("db down");
        assert_eq!(err.resolved_status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.resolved_message(), SERVER_SIDE_ERROR_MESSAGE);

        let err = PipelineError::listen_failure("address in use");
        assert_eq!(err.resolved_message(), SERVER_LISTEN_ERROR_MESSAGE);
    }

    #[test]
    fn stack_walks_the_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "inner");
        let err = PipelineError::router_failure(Outer(io));
        assert!(err.stack().starts_with("outer <- inner"));
    }
}
