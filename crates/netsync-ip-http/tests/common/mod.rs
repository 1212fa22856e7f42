//! Test doubles shared by the resolver and bridge contract tests

#![allow(dead_code)]

use netsync_core::ResolutionConfig;
use netsync_core::error::{Error, Result};
use netsync_core::traits::{AddressSource, HttpRequest, HttpResponse, HttpTransport};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted reaction of the mock transport
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with this response
    Respond(HttpResponse),
    /// Fail at the transport level (connection refused, TLS, ...)
    Fail(String),
    /// Never answer
    Hang,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Reply::Respond(HttpResponse::new(200, body))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond(HttpResponse::new(status, body))
    }

    pub fn refused() -> Self {
        Reply::Fail("connection refused".to_string())
    }
}

/// A scripted HttpTransport that records every request
///
/// Replies for a URL are consumed in order; the last one repeats. URLs with
/// no script fail as if the connection were refused.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    abandoned: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next reply for `url`
    pub fn on(self, url: &str, reply: Reply) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Total requests sent
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests sent to `url`
    pub fn calls_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    /// Every request sent, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Hanging requests whose future was dropped by the caller
    pub fn abandoned_count(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(Reply::refused),
            None => Reply::refused(),
        }
    }
}

/// Counts a hanging request as abandoned when its future is dropped
struct AbandonGuard(Arc<AtomicUsize>);

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = self.next_reply(&request.url);
        self.requests.lock().unwrap().push(request);

        match reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(message) => Err(Error::transport(message)),
            Reply::Hang => {
                let _guard = AbandonGuard(Arc::clone(&self.abandoned));
                std::future::pending().await
            }
        }
    }
}

/// An AddressSource that never completes
pub struct PendingSource;

#[async_trait::async_trait]
impl AddressSource for PendingSource {
    async fn resolve(&self, _config: &ResolutionConfig) -> String {
        std::future::pending::<String>().await
    }

    fn source_name(&self) -> &'static str {
        "pending"
    }
}

pub const IPIFY: &str = "https://api.ipify.org?format=json";
pub const IPINFO: &str = "https://ipinfo.io/json";
pub const IFCONFIG: &str = "https://ifconfig.me/all.json";

/// Default endpoints, jitter-free backoff
pub fn test_config() -> ResolutionConfig {
    ResolutionConfig::default().with_backoff(netsync_core::BackoffConfig::deterministic(100, 2000))
}
