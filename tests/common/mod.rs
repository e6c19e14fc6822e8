//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;
use waypoint::http::server::HttpServer;
use waypoint::lifecycle::Shutdown;
use waypoint::{Dependencies, Logger, Router};

/// Logger that keeps `(level, line)` pairs.
#[derive(Default)]
pub struct CapturingLogger {
    lines: Mutex<Vec<(&'static str, String)>>,
}

impl CapturingLogger {
    pub fn lines(&self, level: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn push(&self, level: &'static str, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl Logger for CapturingLogger {
    fn debug(&self, message: &str) {
        self.push("debug", message);
    }

    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }
}

#[derive(Default)]
pub struct Deps {
    pub logger: CapturingLogger,
}

impl Dependencies for Deps {
    fn logger(&self) -> &dyn Logger {
        &self.logger
    }
}

/// A running server on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub deps: Arc<Deps>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a server for `router` and wait until it logs readiness.
pub async fn start_server<R: Router<Deps>>(router: R) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let deps = Arc::new(Deps::default());
    let shutdown = Shutdown::new();

    let server = HttpServer::new(Arc::clone(&deps), Arc::new(router));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.serve(listener, rx).await;
    });

    wait_until(|| !deps.logger.lines("info").is_empty()).await;
    TestServer { addr, deps, shutdown }
}

/// Poll `condition` for up to two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
