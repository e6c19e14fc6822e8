//! Contracts the pipeline consumes from the socket-level HTTP engine.
//!
//! # Responsibilities
//! - Expose the raw request line, query string, headers, and streamed body
//! - Accept status, header, and body writes for the response
//! - Hand out the per-request abort signal
//!
//! # Design Decisions
//! - The body is pulled chunk by chunk, each chunk flagged as final or not
//! - Response writes are fire-and-forget: the engine owns socket errors

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::future::BoxFuture;

use crate::net::abort::AbortSignal;

/// One fragment of a streamed request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub data: Bytes,
    /// True for the last fragment of the body.
    pub is_last: bool,
}

impl Chunk {
    pub fn more(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), is_last: false }
    }

    pub fn last(data: impl Into<Bytes>) -> Self {
        Self { data: data.into(), is_last: true }
    }
}

/// Raw request as exposed by the engine.
pub trait TransportRequest: Send {
    /// Method token exactly as received (any casing).
    fn method(&self) -> &str;

    /// Request path without the query string.
    fn url(&self) -> &str;

    /// Raw query string without the leading `?`, empty if there is none.
    fn query(&self) -> &str;

    /// Visit every header in the engine's enumeration order.
    fn for_each_header(&self, visit: &mut dyn FnMut(&str, &str));

    /// Next body fragment.
    ///
    /// `None` means the engine has nothing more to deliver for now; callers
    /// then wait on the abort signal rather than treating the body as complete.
    fn next_chunk(&mut self) -> BoxFuture<'_, Option<Chunk>>;
}

/// Raw response as exposed by the engine.
pub trait TransportResponse: Send {
    fn write_status(&mut self, status: StatusCode);

    fn write_header(&mut self, name: &str, value: &str);

    /// Write the body and finish the response.
    fn end(&mut self, body: String);

    /// Register interest in connection aborts for this request.
    fn on_aborted(&mut self) -> AbortSignal;
}
