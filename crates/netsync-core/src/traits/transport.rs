// # HTTP Transport Trait
//
// The one seam between the netsync subsystems and the network.
//
// ## Implementations
//
// - reqwest: `netsync_core::transport::ReqwestTransport`
// - Test doubles: scripted mocks in each crate's `tests/common`
//
// A transport sends exactly one request per call and returns the whole
// response (status, headers, body). It never retries and never applies a
// timeout of its own beyond what its client is configured with; callers race
// it against their own timers. Dropping the returned future must cancel the
// request and release its connection.

use async_trait::async_trait;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Put => f.write_str("PUT"),
        }
    }
}

/// One outbound request
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// Request headers, in insertion order
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Option<String>,
    /// Forward proxy to route this request through
    pub proxy: Option<String>,
}

impl HttpRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            proxy: None,
        }
    }

    /// Create a PUT request with a body
    pub fn put(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Put,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
            proxy: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Route through a forward proxy (or directly when `None`)
    pub fn via_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// Headers can carry credentials (Authorization), so Debug lists names only.
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body_len", &self.body.as_ref().map(|b| b.len()))
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// A complete response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Response headers, in wire order
    pub headers: Vec<(String, String)>,
    /// Response body (lossy UTF-8)
    pub body: String,
}

impl HttpResponse {
    /// Create a response without headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Headers as a JSON object (repeated names are joined with ", ")
    pub fn headers_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.headers {
            let key = name.to_ascii_lowercase();
            match map.get_mut(&key) {
                Some(serde_json::Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    map.insert(key, serde_json::Value::String(value.clone()));
                }
            }
        }
        serde_json::Value::Object(map)
    }
}

/// Trait for HTTP transport implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and read the full response
    ///
    /// # Returns
    ///
    /// - `Ok(HttpResponse)`: Any response, whatever its status
    /// - `Err(Error::Transport)`: Connection, TLS or protocol failure
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, crate::Error>;
}
