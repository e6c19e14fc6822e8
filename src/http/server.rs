//! HTTP server setup.
//!
//! # Responsibilities
//! - Register one wildcard handler (`/` and `/{*path}`, any method)
//! - Hand every request to the dispatch pipeline in its own task
//! - Bind the listener, log readiness, serve until shutdown
//!
//! # Design Decisions
//! - No routing table: the router function sees every request
//! - A bind failure is the only error that leaves this module
//! - A caller may supply a pre-built `axum::Router`; the wildcard is added to it

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::routing::any;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::http::dispatch::{dispatch, Router};
use crate::http::error::PipelineError;
use crate::net::adapter;
use crate::observability::logging::Dependencies;

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 7878;

/// Host used when none is given.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// HTTP server funnelling every request into one router.
pub struct HttpServer<D, R: ?Sized> {
    deps: Arc<D>,
    router: Arc<R>,
    host: String,
    port: u16,
    app: Option<axum::Router>,
}

impl<D, R> HttpServer<D, R>
where
    D: Dependencies,
    R: Router<D> + ?Sized,
{
    pub fn new(deps: Arc<D>, router: Arc<R>) -> Self {
        Self {
            deps,
            router,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            app: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Register the wildcard handler on an existing application.
    ///
    /// The application must not claim `/` or `/{*path}` itself.
    pub fn with_app(mut self, app: axum::Router) -> Self {
        self.app = Some(app);
        self
    }

    /// Build the axum application with the wildcard handler.
    pub fn build_app(&self) -> axum::Router {
        let deps = Arc::clone(&self.deps);
        let router = Arc::clone(&self.router);
        let entry = move |request: Request<Body>| {
            handle(Arc::clone(&deps), Arc::clone(&router), request)
        };

        self.app
            .clone()
            .unwrap_or_default()
            .route("/{*path}", any(entry.clone()))
            .route("/", any(entry))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind `host:port` and serve until `shutdown` fires.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), PipelineError> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                let err = PipelineError::listen_failure(e);
                self.deps.logger().error(&format!(
                    "{} on {}. Stack: {}",
                    err.resolved_message(),
                    addr,
                    err.stack()
                ));
                return Err(err);
            }
        };
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), PipelineError> {
        let port = listener
            .local_addr()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        let app = self.build_app();

        self.deps.logger().info(&format!("Listening on port {}", port));

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await
            .map_err(PipelineError::listen_failure)?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Start serving `router` with the given dependencies.
///
/// `port` defaults to [`DEFAULT_PORT`]; `app` is an optional pre-built application.
pub async fn bootstrap<D, R>(
    deps: Arc<D>,
    router: Arc<R>,
    port: Option<u16>,
    app: Option<axum::Router>,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), PipelineError>
where
    D: Dependencies,
    R: Router<D> + ?Sized,
{
    let mut server = HttpServer::new(deps, router).with_port(port.unwrap_or(DEFAULT_PORT));
    if let Some(app) = app {
        server = server.with_app(app);
    }
    server.run(shutdown).await
}

/// Wildcard handler: run the pipeline in its own task and await its reply.
async fn handle<D, R>(deps: Arc<D>, router: Arc<R>, request: Request<Body>) -> Response
where
    D: Dependencies,
    R: Router<D> + ?Sized,
{
    let exchange = adapter::split(request);
    tokio::spawn(dispatch(deps, router, exchange.request, exchange.response));
    exchange.reply.wait().await
}
