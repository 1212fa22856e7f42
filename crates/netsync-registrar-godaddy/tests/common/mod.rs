//! Test doubles for the publish contract tests

#![allow(dead_code)]

use netsync_core::error::{Error, Result};
use netsync_core::traits::{HttpRequest, HttpResponse, HttpTransport, RegistrarCredentials};
use netsync_core::AuditLog;
use netsync_registrar_godaddy::GoDaddyRegistrar;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A transport that answers every request the same way and records it
pub struct MockTransport {
    reply: std::result::Result<HttpResponse, String>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn responding(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(HttpResponse::new(status, body)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn responding_with(response: HttpResponse) -> Self {
        Self {
            reply: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(Error::transport(message.clone())),
        }
    }
}

/// A registrar wired to a mock transport and an audit log in a temp dir
pub struct Harness {
    pub registrar: GoDaddyRegistrar,
    pub transport: Arc<MockTransport>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        let dir = TempDir::new().unwrap();
        let audit = Arc::new(AuditLog::new(dir.path().join("logs").join("godaddy-api.log")));
        let transport = Arc::new(transport);
        let registrar =
            GoDaddyRegistrar::new(Arc::clone(&transport) as Arc<dyn HttpTransport>, audit)
                .with_api_base("https://api.test.invalid");

        Self {
            registrar,
            transport,
            dir,
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.registrar = self.registrar.with_dry_run(true);
        self
    }

    /// Full audit log contents ("" when nothing was written)
    pub fn audit_text(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("logs").join("godaddy-api.log"))
            .unwrap_or_default()
    }
}

pub const DOMAIN: &str = "example.com";
pub const RECORDS_URL: &str = "https://api.test.invalid/v1/domains/example.com/records";

pub fn nameservers() -> Vec<String> {
    vec!["ns-1.awsdns-01.org".to_string(), "ns-2.awsdns-02.net".to_string()]
}

pub fn credentials() -> RegistrarCredentials {
    RegistrarCredentials::new("key-abc123", "secret-xyz789")
}
