//! HTTP request-processing subsystem.
//!
//! # Data Flow
//! ```text
//! axum wildcard handler
//!     → server.rs (spawn one pipeline task per request)
//!     → request.rs (method gate, query, headers)
//!     → body.rs (assemble chunks, parse JSON object)
//!     → dispatch.rs (router call, abort checkpoint)
//!     → response.rs (outcome or error written once)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - All failures share one shape, [`error::PipelineError`]
//! - Nothing here holds state across requests

pub mod body;
pub mod dispatch;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{dispatch, ResponseType, RouteResult, Router, RouterOutcome};
pub use error::{make_error, PipelineError};
pub use server::{bootstrap, HttpServer, DEFAULT_PORT};
