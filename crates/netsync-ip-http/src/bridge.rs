//! Blocking bridge for callers without an async runtime
//!
//! The provisioning process assembles its configuration before any runtime
//! exists and cannot await. `SyncBridge` runs the resolution to completion on
//! a dedicated worker thread that owns a current-thread runtime, and blocks the
//! caller on a one-shot channel. The caller never polls the runtime it is
//! waiting on, so there is no self-deadlock and no busy loop.
//!
//! ```rust,no_run
//! use netsync_core::ResolutionConfig;
//! use netsync_ip_http::{AddressResolver, SyncBridge};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = SyncBridge::new(Arc::new(AddressResolver::with_reqwest()?));
//!     let cidr = bridge.resolve_blocking(&ResolutionConfig::default())?;
//!     println!("allowed_ip_address={}", cidr);
//!     Ok(())
//! }
//! ```

use netsync_core::traits::AddressSource;
use netsync_core::{Error, ResolutionConfig, Result, UNRESTRICTED_CIDR};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, error};

/// Slack added on top of `per_attempt_timeout × max_retry_passes`
pub const DEFAULT_BRIDGE_GRACE: Duration = Duration::from_millis(1000);

/// Blocking adapter over an [`AddressSource`]
pub struct SyncBridge {
    source: Arc<dyn AddressSource>,
    grace: Duration,
}

impl SyncBridge {
    /// Create a bridge with the default grace period
    pub fn new(source: Arc<dyn AddressSource>) -> Self {
        Self {
            source,
            grace: DEFAULT_BRIDGE_GRACE,
        }
    }

    /// Override the grace period
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Longest the caller will be blocked for `config`
    pub fn bound(&self, config: &ResolutionConfig) -> Duration {
        let passes = u32::try_from(config.max_retry_passes).unwrap_or(u32::MAX);
        config
            .per_attempt_timeout()
            .saturating_mul(passes)
            .saturating_add(self.grace)
    }

    /// Resolve the public address, blocking the current thread
    ///
    /// # Returns
    ///
    /// - `Ok(cidr)`: The resolved CIDR, or `0.0.0.0/0` when discovery failed
    /// - `Err(Error::BridgeTimeout)`: The source did not finish within
    ///   [`SyncBridge::bound`]. The worker is abandoned, not aborted.
    ///
    /// Must not be called from inside an async task: it blocks the thread.
    pub fn resolve_blocking(&self, config: &ResolutionConfig) -> Result<String> {
        let bound = self.bound(config);
        let (tx, rx) = mpsc::sync_channel::<String>(1);

        let source = Arc::clone(&self.source);
        let config = config.clone();

        let spawned = std::thread::Builder::new()
            .name("netsync-resolve".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!("Failed to create resolver runtime: {}", e);
                        return;
                    }
                };

                let cidr = runtime.block_on(source.resolve(&config));

                // The caller may have stopped waiting
                let _ = tx.send(cidr);
            });

        if let Err(e) = spawned {
            error!("Failed to start resolver worker, using {}: {}", UNRESTRICTED_CIDR, e);
            return Ok(UNRESTRICTED_CIDR.to_string());
        }

        debug!(
            "Waiting up to {:?} for {} address resolution",
            bound,
            self.source.source_name()
        );

        match rx.recv_timeout(bound) {
            Ok(cidr) => Ok(cidr),
            Err(RecvTimeoutError::Timeout) => {
                error!("Address resolution did not finish within {:?}", bound);
                Err(Error::bridge_timeout(bound))
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!(
                    "Resolver worker exited without a result, using {}",
                    UNRESTRICTED_CIDR
                );
                Ok(UNRESTRICTED_CIDR.to_string())
            }
        }
    }
}
