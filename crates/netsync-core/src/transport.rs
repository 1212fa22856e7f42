// # reqwest Transport
//
// Production `HttpTransport` backed by reqwest.
//
// Requests without a proxy share one client (and its connection pool).
// Requests routed through a proxy use a client built for that proxy URL,
// created on first use and reused afterwards.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::Error;
use crate::traits::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Default client-level timeout (30 seconds)
///
/// Callers race requests against their own, usually shorter, timers. This only
/// bounds requests nobody is racing.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-backed transport
pub struct ReqwestTransport {
    /// Client for direct requests
    direct: reqwest::Client,

    /// Clients for proxied requests, keyed by proxy URL
    proxied: Mutex<HashMap<String, reqwest::Client>>,

    /// Client-level timeout
    timeout: Duration,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Create a transport with the default timeout
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a transport with a custom client-level timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        Ok(Self {
            direct: build_client(None, timeout)?,
            proxied: Mutex::new(HashMap::new()),
            timeout,
        })
    }

    /// Client for a request, building the proxied variant when needed
    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client, Error> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut proxied = self
            .proxied
            .lock()
            .map_err(|_| Error::transport("Proxy client cache poisoned"))?;

        if let Some(client) = proxied.get(proxy) {
            return Ok(client.clone());
        }

        tracing::debug!("Building HTTP client for proxy {}", proxy);
        let client = build_client(Some(proxy), self.timeout)?;
        proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

fn build_client(proxy: Option<&str>, timeout: Duration) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder().timeout(timeout);

    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let client = self.client_for(request.proxy.as_deref())?;

        let mut builder = match request.method {
            HttpMethod::Get => client.get(&request.url),
            HttpMethod::Put => client.put(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request to {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
