//! Configuration types for the netsync subsystems
//!
//! This module defines the address-resolution options, the lookup endpoint
//! registry and the registrar selection used by the provisioning hook.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lookup services used when no endpoints are configured, in priority order
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org?format=json", // {"ip": "..."}
    "https://ipinfo.io/json",            // {"ip": "..."}
    "https://ifconfig.me/all.json",      // {"ip_addr": "..."}
];

/// Default registrar API base URL
pub const GODADDY_API_BASE: &str = "https://api.godaddy.com";

/// Options for a single address resolution
///
/// Immutable per call. Every field has a default, so an empty JSON object
/// deserializes to the stock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// When false, no lookup happens and the unrestricted CIDR is returned
    #[serde(default = "default_use_current_ip")]
    pub use_current_ip: bool,

    /// Bound on each individual endpoint attempt (in milliseconds)
    #[serde(default = "default_per_attempt_timeout_ms")]
    pub per_attempt_timeout_ms: u64,

    /// Full passes over the endpoint list before giving up
    #[serde(default = "default_max_retry_passes")]
    pub max_retry_passes: usize,

    /// Lookup services in priority order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointSpec>,

    /// Forward proxy for every outbound lookup request
    #[serde(default)]
    pub proxy: Option<String>,

    /// Delay policy between passes
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// User-Agent header sent to lookup services
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl ResolutionConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            use_current_ip: default_use_current_ip(),
            per_attempt_timeout_ms: default_per_attempt_timeout_ms(),
            max_retry_passes: default_max_retry_passes(),
            endpoints: default_endpoints(),
            proxy: None,
            backoff: BackoffConfig::default(),
            user_agent: default_user_agent(),
        }
    }

    /// Configuration that skips discovery entirely
    pub fn disabled() -> Self {
        Self {
            use_current_ip: false,
            ..Self::new()
        }
    }

    /// Replace the endpoint list
    pub fn with_endpoints(mut self, endpoints: Vec<EndpointSpec>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the number of passes
    pub fn with_max_retry_passes(mut self, passes: usize) -> Self {
        self.max_retry_passes = passes;
        self
    }

    /// Route lookups through a forward proxy
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Replace the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Per-attempt timeout as a `Duration`
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.use_current_ip {
            return Ok(());
        }

        if self.endpoints.is_empty() {
            return Err(crate::Error::config("At least one lookup endpoint is required"));
        }
        if self.per_attempt_timeout_ms == 0 {
            return Err(crate::Error::config("Per-attempt timeout must be > 0"));
        }
        if self.max_retry_passes == 0 {
            return Err(crate::Error::config("Retry passes must be > 0"));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        if let Some(ref proxy) = self.proxy {
            let url = reqwest::Url::parse(proxy)
                .map_err(|e| crate::Error::config(format!("Invalid proxy URL '{}': {}", proxy, e)))?;
            if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
                return Err(crate::Error::config(format!(
                    "Unsupported proxy scheme: {}",
                    url.scheme()
                )));
            }
        }

        self.backoff.validate()
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rule mapping a lookup response body to an address string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum IpExtractor {
    /// JSON object; the address is the string under this key
    JsonField(String),
    /// Body is the bare address (whitespace trimmed)
    PlainText,
}

/// One lookup service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// URL to request
    pub url: String,

    /// Explicit extractor; inferred from the URL when absent
    #[serde(default)]
    pub extractor: Option<IpExtractor>,
}

impl EndpointSpec {
    /// Create an endpoint whose extractor is inferred from its URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extractor: None,
        }
    }

    /// Create an endpoint with an explicit extractor
    pub fn with_extractor(url: impl Into<String>, extractor: IpExtractor) -> Self {
        Self {
            url: url.into(),
            extractor: Some(extractor),
        }
    }

    /// The extractor to apply to this endpoint's responses
    ///
    /// `None` means the service is not recognized and its responses cannot
    /// be parsed.
    pub fn extractor(&self) -> Option<IpExtractor> {
        self.extractor
            .clone()
            .or_else(|| known_service_extractor(&self.url))
    }

    /// Validate the endpoint URL
    pub fn validate(&self) -> Result<(), crate::Error> {
        let url = reqwest::Url::parse(&self.url).map_err(|e| {
            crate::Error::config(format!("Invalid endpoint URL '{}': {}", self.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(crate::Error::config(format!(
                "Endpoint URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

/// Identify a known lookup service by URL
///
/// Matching is on host and path: the same service can answer in JSON or in
/// plain text depending on the route.
pub fn known_service_extractor(url: &str) -> Option<IpExtractor> {
    let url = reqwest::Url::parse(url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let path = url.path();
    let wants_json = url
        .query_pairs()
        .any(|(k, v)| k == "format" && v == "json");

    match host.as_str() {
        "api.ipify.org" | "api64.ipify.org" | "api4.ipify.org" => {
            if wants_json {
                Some(IpExtractor::JsonField("ip".to_string()))
            } else {
                Some(IpExtractor::PlainText)
            }
        }
        "ipinfo.io" => match path {
            "/" | "/json" => Some(IpExtractor::JsonField("ip".to_string())),
            "/ip" => Some(IpExtractor::PlainText),
            _ => None,
        },
        "ifconfig.me" => match path {
            "/all.json" => Some(IpExtractor::JsonField("ip_addr".to_string())),
            "/" | "/ip" => Some(IpExtractor::PlainText),
            _ => None,
        },
        "icanhazip.com" | "ipv4.icanhazip.com" => Some(IpExtractor::PlainText),
        _ => None,
    }
}

/// Delay policy between retry passes
///
/// Pass `n` (counting from 1 for the first retry) waits
/// `min(base_delay_ms * 2^(n-1), max_delay_ms)`, reduced by a uniformly random
/// share of up to `jitter_factor` of itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the second pass (in milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on any single delay (in milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Share of the delay that may be randomly removed (0.0-1.0)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl BackoffConfig {
    /// Backoff without randomness
    pub fn deterministic(base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            jitter_factor: 0.0,
        }
    }

    /// No delay between passes
    pub fn none() -> Self {
        Self::deterministic(0, 0)
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(crate::Error::config(format!(
                "Backoff jitter factor must be between 0.0 and 1.0. Got: {}",
                self.jitter_factor
            )));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(crate::Error::config(
                "Backoff max delay must not be below the base delay",
            ));
        }
        Ok(())
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

/// Registrar selection for nameserver publication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistrarConfig {
    /// GoDaddy domains API
    #[serde(rename = "godaddy")]
    GoDaddy {
        /// API base URL (override for OTE or tests)
        #[serde(default = "default_godaddy_api_base")]
        api_base: String,
        /// Log the intended change instead of sending it
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom registrar
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistrarConfig {
    /// Validate the registrar configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistrarConfig::GoDaddy { api_base, .. } => {
                if !api_base.starts_with("https://") && !api_base.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Registrar API base must use HTTP or HTTPS scheme. Got: {}",
                        api_base
                    )));
                }
                Ok(())
            }
            RegistrarConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registrar factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom registrar config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the registrar type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistrarConfig::GoDaddy { .. } => "godaddy",
            RegistrarConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        RegistrarConfig::GoDaddy {
            api_base: default_godaddy_api_base(),
            dry_run: false,
        }
    }
}

fn default_use_current_ip() -> bool {
    true
}

fn default_per_attempt_timeout_ms() -> u64 {
    3000
}

fn default_max_retry_passes() -> usize {
    3
}

fn default_endpoints() -> Vec<EndpointSpec> {
    DEFAULT_ENDPOINTS.iter().map(|url| EndpointSpec::new(*url)).collect()
}

fn default_user_agent() -> String {
    format!("netsync-ip-helper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_jitter_factor() -> f64 {
    0.5
}

fn default_godaddy_api_base() -> String {
    GODADDY_API_BASE.to_string()
}
