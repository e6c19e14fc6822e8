//! In-memory transport and logger for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::net::abort::{self, AbortHandle, AbortSignal};
use crate::net::transport::{Chunk, TransportRequest, TransportResponse};
use crate::observability::logging::{Dependencies, Logger};

pub struct MockRequest {
    method: String,
    url: String,
    query: String,
    headers: Vec<(String, String)>,
    chunks: VecDeque<Chunk>,
    pub chunk_reads: usize,
}

impl MockRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_string(),
            url: url.to_string(),
            query: String::new(),
            headers: Vec::new(),
            chunks: VecDeque::new(),
            chunk_reads: 0,
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new("get", url)
    }

    pub fn post(url: &str) -> Self {
        Self::new("post", url)
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn chunk(mut self, chunk: Chunk) -> Self {
        self.chunks.push_back(chunk);
        self
    }

    /// Whole body as one final chunk.
    pub fn body(self, body: &str) -> Self {
        self.chunk(Chunk::last(body.to_string()))
    }
}

impl TransportRequest for MockRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn for_each_header(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (name, value) in &self.headers {
            visit(name, value);
        }
    }

    fn next_chunk(&mut self) -> BoxFuture<'_, Option<Chunk>> {
        self.chunk_reads += 1;
        let next = self.chunks.pop_front();
        Box::pin(async move { next })
    }
}

/// One call made against a [`RecordingResponse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Status(StatusCode),
    Header(String, String),
    End(String),
}

/// Response that records every write in order.
pub struct RecordingResponse {
    pub writes: Vec<Write>,
    pub abort: AbortHandle,
    signal: AbortSignal,
}

impl RecordingResponse {
    pub fn new() -> Self {
        let (abort, signal) = abort::channel();
        Self {
            writes: Vec::new(),
            abort,
            signal,
        }
    }
}

impl TransportResponse for RecordingResponse {
    fn write_status(&mut self, status: StatusCode) {
        self.writes.push(Write::Status(status));
    }

    fn write_header(&mut self, name: &str, value: &str) {
        self.writes.push(Write::Header(name.to_string(), value.to_string()));
    }

    fn end(&mut self, body: String) {
        self.writes.push(Write::End(body));
    }

    fn on_aborted(&mut self) -> AbortSignal {
        self.signal.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Logger that keeps every line; clones share the same buffer.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<(Level, String)>>>,
}

impl RecordingLogger {
    pub fn lines(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}

/// Dependency bundle whose logger records.
#[derive(Clone, Default)]
pub struct TestDeps {
    pub logger: RecordingLogger,
}

impl Dependencies for TestDeps {
    fn logger(&self) -> &dyn Logger {
        &self.logger
    }
}
