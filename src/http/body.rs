//! Streaming request body assembly.
//!
//! # Responsibilities
//! - Concatenate body chunks as the transport delivers them
//! - Parse the complete buffer as a JSON object once the final chunk arrives
//! - Give up (and free the buffer) when the connection aborts
//!
//! # Design Decisions
//! - The accumulator lives exactly as long as one call to [`assemble`]
//! - No timeout here: the transport owns read timeouts, this side only
//!   reacts to the final chunk or to the abort signal

use bytes::BytesMut;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::net::abort::AbortSignal;
use crate::net::transport::TransportRequest;

/// Parsed request body: a JSON object.
pub type RequestBody = Map<String, Value>;

/// Why the body could not be produced.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The assembled bytes are not a JSON object.
    #[error("body is not a valid JSON object: {0}")]
    Parse(#[from] serde_json::Error),

    /// The connection was aborted before the final chunk.
    #[error("connection aborted while reading the body")]
    Aborted,
}

/// Read chunks until the final one, then parse the whole buffer.
///
/// Handles bodies delivered as one chunk (first and final at once) or many.
pub async fn assemble<T>(request: &mut T, abort: &AbortSignal) -> Result<RequestBody, BodyError>
where
    T: TransportRequest + ?Sized,
{
    let mut buffer: Option<BytesMut> = None;

    loop {
        let chunk = tokio::select! {
            biased;
            _ = abort.aborted() => return Err(BodyError::Aborted),
            chunk = request.next_chunk() => chunk,
        };

        let Some(chunk) = chunk else {
            // Nothing more will come until the transport aborts.
            abort.aborted().await;
            return Err(BodyError::Aborted);
        };

        let acc = buffer.get_or_insert_with(BytesMut::new);
        acc.extend_from_slice(&chunk.data);

        if chunk.is_last {
            let bytes = buffer.take().unwrap_or_default();
            return parse(&bytes);
        }
    }
}

/// Parse a complete body buffer.
pub fn parse(bytes: &[u8]) -> Result<RequestBody, BodyError> {
    Ok(serde_json::from_slice::<RequestBody>(bytes)?)
}
