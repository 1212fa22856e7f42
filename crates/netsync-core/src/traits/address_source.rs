// # Address Source Trait
//
// Defines the interface for discovering the caller's public address.
//
// ## Implementations
//
// - HTTP lookup services: `netsync-ip-http` crate (`AddressResolver`)
//
// ## Usage
//
// ```rust,ignore
// use netsync_core::{AddressSource, ResolutionConfig};
//
// #[tokio::main]
// async fn main() {
//     let source = /* AddressSource implementation */;
//     let cidr = source.resolve(&ResolutionConfig::default()).await;
//     println!("allowed: {}", cidr);
// }
// ```

use async_trait::async_trait;

use crate::config::ResolutionConfig;

/// Trait for address source implementations
///
/// # Contract
///
/// `resolve` never fails. Whatever goes wrong (timeouts, malformed bodies,
/// refused connections, 5xx) degrades to [`crate::UNRESTRICTED_CIDR`], because
/// the value gates a best-effort access restriction and must never abort
/// provisioning.
///
/// Implementations must be thread-safe and usable across async tasks and
/// threads; the blocking bridge drives them from a worker thread.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Discover the public address as a CIDR string
    ///
    /// # Returns
    ///
    /// `"<ip>/32"` (or the prefix the service reported), or `"0.0.0.0/0"`.
    async fn resolve(&self, config: &ResolutionConfig) -> String;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
