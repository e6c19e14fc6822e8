//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide tracing subscriber
//! - Define the logger capability injected into the pipeline and the router
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - The pipeline never reaches for a global logger; it logs through
//!   the [`Logger`] carried by the dependency bundle

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Logging capability: four levels, each taking a preformatted line.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// [`Logger`] that forwards to `tracing` under the `waypoint` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "waypoint", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "waypoint", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "waypoint", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "waypoint", "{}", message);
    }
}

/// Dependency bundle handed to the pipeline and to every router call.
///
/// Only the logger is mandatory; applications put their own collaborators
/// (stores, clients) on the implementing type.
pub trait Dependencies: Send + Sync + 'static {
    fn logger(&self) -> &dyn Logger;
}

/// The minimal bundle: just a logger.
#[derive(Clone)]
pub struct MainDependencies {
    pub logger: Arc<dyn Logger>,
}

impl MainDependencies {
    pub fn new(logger: impl Logger + 'static) -> Self {
        Self { logger: Arc::new(logger) }
    }
}

impl Default for MainDependencies {
    fn default() -> Self {
        Self::new(TracingLogger)
    }
}

impl Dependencies for MainDependencies {
    fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}
