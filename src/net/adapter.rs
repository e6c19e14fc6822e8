//! axum/hyper implementation of the transport contracts.
//!
//! # Responsibilities
//! - Wrap an incoming `Request<Body>` as a [`TransportRequest`]
//! - Collect pipeline writes into a `Response` delivered over a oneshot
//! - Raise the abort token when the client goes away
//!
//! # Data Flow
//! ```text
//! axum handler
//!     → split()  ──▶ AxumRequest + ChannelResponse  (moved into the pipeline task)
//!     → PendingReply::wait()  ◀── oneshot ── ChannelResponse::end()
//! ```
//!
//! # Design Decisions
//! - Hyper drops the handler future when the connection closes; the reply
//!   guard turns that drop into an abort
//! - A failed body read also counts as an abort

use axum::body::{Body, BodyDataStream};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use tokio::sync::oneshot;

use crate::net::abort::{self, AbortHandle, AbortSignal};
use crate::net::transport::{Chunk, TransportRequest, TransportResponse};

/// Transport pieces for one request.
pub struct Exchange {
    pub request: AxumRequest,
    pub response: ChannelResponse,
    pub reply: PendingReply,
}

/// Split an axum request into the transport halves plus the reply the handler awaits.
pub fn split(request: Request<Body>) -> Exchange {
    let (handle, signal) = abort::channel();
    let (tx, rx) = oneshot::channel();
    let (parts, body) = request.into_parts();

    let request = AxumRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or_default().to_string(),
        headers: parts.headers,
        body: body.into_data_stream(),
        finished: false,
        abort: handle.clone(),
    };

    let response = ChannelResponse {
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        reply: Some(tx),
        signal,
    };

    let reply = PendingReply {
        rx,
        guard: AbortOnDrop { handle: Some(handle) },
    };

    Exchange { request, response, reply }
}

/// Request half backed by the hyper body stream.
pub struct AxumRequest {
    method: String,
    path: String,
    query: String,
    headers: HeaderMap,
    body: BodyDataStream,
    finished: bool,
    abort: AbortHandle,
}

impl TransportRequest for AxumRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> &str {
        &self.path
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn for_each_header(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (name, value) in self.headers.iter() {
            visit(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
    }

    fn next_chunk(&mut self) -> BoxFuture<'_, Option<Chunk>> {
        Box::pin(async move {
            if self.finished {
                return None;
            }
            match self.body.next().await {
                Some(Ok(data)) => Some(Chunk::more(data)),
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Request body stream failed");
                    self.finished = true;
                    self.abort.abort();
                    None
                }
                None => {
                    self.finished = true;
                    Some(Chunk::last(Bytes::new()))
                }
            }
        })
    }
}

/// Response half that assembles an axum `Response` and ships it on `end`.
pub struct ChannelResponse {
    status: StatusCode,
    headers: HeaderMap,
    reply: Option<oneshot::Sender<Response>>,
    signal: AbortSignal,
}

impl TransportResponse for ChannelResponse {
    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping unrepresentable response header"),
        }
    }

    fn end(&mut self, body: String) {
        let Some(tx) = self.reply.take() else {
            tracing::warn!("Response already ended, ignoring second write");
            return;
        };
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        // The receiver is gone only if the handler was dropped.
        let _ = tx.send(response);
    }

    fn on_aborted(&mut self) -> AbortSignal {
        self.signal.clone()
    }
}

/// What the axum handler waits on.
pub struct PendingReply {
    rx: oneshot::Receiver<Response>,
    guard: AbortOnDrop,
}

impl PendingReply {
    /// Wait for the pipeline to end the response.
    ///
    /// If the pipeline finishes without writing (it observed an abort), an
    /// empty 500 is handed back to hyper; the client is gone by then anyway.
    pub async fn wait(mut self) -> Response {
        let result = (&mut self.rx).await;
        self.guard.disarm();
        match result {
            Ok(response) => response,
            Err(_) => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}

/// Raises the abort token unless disarmed before drop.
struct AbortOnDrop {
    handle: Option<AbortHandle>,
}

impl AbortOnDrop {
    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!("Client went away before the response was ready");
            handle.abort();
        }
    }
}
