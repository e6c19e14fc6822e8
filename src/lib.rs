//! Waypoint: a minimal HTTP request-processing pipeline.
//!
//! Sits between a socket-level HTTP engine and a single user-supplied router
//! function. Every request goes through one wildcard entry point, is normalized
//! into a [`NormalizedRequest`], handed to the router, and the outcome (or the
//! failure) is written back on the wire exactly once.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod validators;

pub use config::schema::ServerConfig;
pub use http::dispatch::{dispatch, ResponseType, RouteResult, Router, RouterOutcome};
pub use http::error::{make_error, BoxError, PipelineError};
pub use http::request::{Headers, Method, NormalizedRequest};
pub use http::server::{bootstrap, HttpServer};
pub use lifecycle::Shutdown;
pub use observability::logging::{Dependencies, Logger, MainDependencies, TracingLogger};
