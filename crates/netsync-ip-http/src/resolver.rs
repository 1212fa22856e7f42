//! Public address resolver
//!
//! ## Algorithm
//!
//! 1. `use_current_ip == false` → unrestricted CIDR, no network access
//! 2. Valid cache entry → cached value, no network access
//! 3. Up to `max_retry_passes` passes over the endpoints, in order. Each
//!    attempt races one request against the per-attempt timer; the losing
//!    request is dropped, which cancels it and releases its connection.
//! 4. First parsed address wins: it is cached and returned
//! 5. Nothing parsed → unrestricted CIDR, cache untouched
//!
//! Attempts are sequential, so one resolver holds at most one outbound
//! connection at a time.

use async_trait::async_trait;
use netsync_core::cache::DEFAULT_CACHE_TTL;
use netsync_core::traits::{AddressSource, HttpRequest, HttpTransport};
use netsync_core::{
    CachedAddress, EndpointSpec, Error, ReqwestTransport, ResolutionConfig, Result,
    UNRESTRICTED_CIDR,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::backoff::delay_before_pass;
use crate::extract::{extract_address, to_cidr};

/// How a resolution ended
///
/// This is the explicit form of the "never fails" contract: every path yields
/// a usable CIDR through [`Resolution::cidr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Discovery is turned off for this call
    Disabled,
    /// Served from the cache
    Cached(String),
    /// Fetched from a lookup service
    Resolved {
        /// The discovered CIDR
        cidr: String,
        /// Endpoint that answered
        endpoint: String,
        /// Attempts made, including the successful one
        attempts: usize,
    },
    /// Every attempt failed
    Fallback {
        /// Attempts made
        attempts: usize,
    },
}

impl Resolution {
    /// The CIDR this resolution stands for
    pub fn cidr(&self) -> &str {
        match self {
            Resolution::Cached(cidr) | Resolution::Resolved { cidr, .. } => cidr,
            Resolution::Disabled | Resolution::Fallback { .. } => UNRESTRICTED_CIDR,
        }
    }

    /// Consume into the CIDR string
    pub fn into_cidr(self) -> String {
        match self {
            Resolution::Cached(cidr) | Resolution::Resolved { cidr, .. } => cidr,
            Resolution::Disabled | Resolution::Fallback { .. } => UNRESTRICTED_CIDR.to_string(),
        }
    }

    /// Whether discovery was attempted and failed
    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

/// Resolver for the caller's public address
///
/// Each instance owns its cache. Share one instance (behind an `Arc`) between
/// call sites that should share cached results; tests use fresh instances.
///
/// The cache lock is held for the whole check-fetch-store step, so concurrent
/// callers never both miss and duplicate network work: the second caller waits
/// and is then served from the cache.
pub struct AddressResolver {
    /// Network seam
    transport: Arc<dyn HttpTransport>,

    /// Last successful resolution
    cache: Mutex<Option<CachedAddress>>,

    /// Validity window for cached addresses
    cache_ttl: Duration,
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl AddressResolver {
    /// Create a resolver over a transport
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            cache: Mutex::new(None),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Create a resolver backed by reqwest
    pub fn with_reqwest() -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?)))
    }

    /// Override the cache validity window
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// The cached CIDR, if still valid
    pub async fn cached(&self) -> Option<String> {
        self.cache
            .lock()
            .await
            .as_ref()
            .and_then(|entry| entry.get())
            .map(str::to_string)
    }

    /// Drop the cached address
    pub async fn clear_cache(&self) {
        *self.cache.lock().await = None;
    }

    /// Resolve the public address, reporting how the answer was obtained
    pub async fn resolve_detailed(&self, config: &ResolutionConfig) -> Resolution {
        if !config.use_current_ip {
            debug!("Address discovery disabled, using {}", UNRESTRICTED_CIDR);
            return Resolution::Disabled;
        }

        let mut cache = self.cache.lock().await;

        if let Some(cidr) = cache.as_ref().and_then(|entry| entry.get()) {
            debug!("Using cached address {}", cidr);
            return Resolution::Cached(cidr.to_string());
        }

        if let Err(e) = config.validate() {
            warn!("Unusable resolution config, using {}: {}", UNRESTRICTED_CIDR, e);
            return Resolution::Fallback { attempts: 0 };
        }

        let passes = config.max_retry_passes;
        let mut attempts = 0;

        for pass in 0..passes {
            let delay = delay_before_pass(pass, &config.backoff);
            if !delay.is_zero() {
                debug!("Waiting {:?} before pass {}/{}", delay, pass + 1, passes);
                tokio::time::sleep(delay).await;
            }

            for endpoint in &config.endpoints {
                attempts += 1;

                match self.attempt(endpoint, config).await {
                    Ok(cidr) => {
                        info!("Discovered public address {} via {}", cidr, endpoint.url);
                        *cache = Some(CachedAddress::new(cidr.clone(), self.cache_ttl));
                        return Resolution::Resolved {
                            cidr,
                            endpoint: endpoint.url.clone(),
                            attempts,
                        };
                    }
                    Err(e) => {
                        warn!(
                            "Failed to fetch IP from {} (pass {}/{}): {}",
                            endpoint.url,
                            pass + 1,
                            passes,
                            e
                        );
                    }
                }
            }

            warn!(
                "Pass {} failed. {} pass(es) left",
                pass + 1,
                passes - pass - 1
            );
        }

        let exhausted = Error::AllEndpointsExhausted { passes, attempts };
        error!("All IP fetch attempts failed, using {}: {}", UNRESTRICTED_CIDR, exhausted);
        Resolution::Fallback { attempts }
    }

    /// One endpoint attempt, raced against the per-attempt timeout
    async fn attempt(&self, endpoint: &EndpointSpec, config: &ResolutionConfig) -> Result<String> {
        let extractor = endpoint
            .extractor()
            .ok_or_else(|| Error::endpoint_parse(&endpoint.url, "unrecognized lookup service"))?;

        let request = HttpRequest::get(&endpoint.url)
            .header("User-Agent", &config.user_agent)
            .header("Accept", "application/json, text/plain")
            .via_proxy(config.proxy.clone());

        debug!("Requesting {}", endpoint.url);

        let timeout = config.per_attempt_timeout();
        let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::endpoint_timeout(&endpoint.url, timeout)),
        };

        if !response.is_success() {
            return Err(Error::transport(format!(
                "HTTP error {} from {}",
                response.status, endpoint.url
            )));
        }

        let raw = extract_address(&response.body, &extractor)
            .map_err(|message| Error::endpoint_parse(&endpoint.url, message))?;

        to_cidr(&raw).map_err(|message| Error::endpoint_parse(&endpoint.url, message))
    }
}

#[async_trait]
impl AddressSource for AddressResolver {
    async fn resolve(&self, config: &ResolutionConfig) -> String {
        self.resolve_detailed(config).await.into_cidr()
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
