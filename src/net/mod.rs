//! Transport layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming HTTP request (hyper via axum)
//!     → adapter.rs (wrap as TransportRequest / TransportResponse)
//!     → abort.rs (per-request abort token)
//!     → Hand off to the dispatch pipeline
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees the traits in transport.rs, never axum types
//! - Abort is a one-way flag; nothing in this layer retries or times out

pub mod abort;
pub mod adapter;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use abort::{AbortHandle, AbortSignal};
pub use transport::{Chunk, TransportRequest, TransportResponse};
