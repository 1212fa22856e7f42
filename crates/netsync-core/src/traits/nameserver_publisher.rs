// # Nameserver Publisher Trait
//
// Defines the interface for pushing a hosted zone's authoritative nameservers
// to the domain's registrar.
//
// ## Implementations
//
// - GoDaddy: `netsync-registrar-godaddy` crate
//
// ## Usage
//
// ```rust,ignore
// use netsync_core::traits::{NameserverPublisher, RegistrarCredentials};
//
// #[tokio::main]
// async fn main() {
//     let publisher = /* NameserverPublisher implementation */;
//     let credentials = RegistrarCredentials::new("key", "secret");
//
//     publisher.publish(
//         "example.com",
//         &["ns1.example.net".to_string(), "ns2.example.net".to_string()],
//         &credentials,
//     ).await;
// }
// ```

use async_trait::async_trait;

/// Registrar API credentials
///
/// Neither value ever appears in `Debug` output or in any log.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrarCredentials {
    /// API key
    /// ⚠️ NEVER log this value
    pub api_key: String,
    /// API secret
    /// ⚠️ NEVER log this value
    pub api_secret: String,
}

impl RegistrarCredentials {
    /// Create credentials
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Whether both key and secret are present
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl std::fmt::Debug for RegistrarCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarCredentials")
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .finish()
    }
}

/// What a publish call ended up doing
///
/// Informational only: none of these is an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The registrar accepted the nameservers
    Published,
    /// Dry-run mode: the request was logged but not sent
    DryRun,
    /// A precondition failed; nothing was sent
    Skipped(String),
    /// The registrar answered with a non-200 status
    Rejected {
        /// HTTP status code
        status: u16,
    },
    /// The request never produced a response
    TransportFailed,
}

impl PublishOutcome {
    /// Whether the nameservers were published
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published)
    }
}

/// Trait for registrar implementations
///
/// # Contract
///
/// - **Never fails visibly**: every error path is logged and `publish` returns
/// - **Single-shot**: exactly one update request per call, no retry
/// - **Stateless**: nothing is cached between calls
///
/// This is a one-time convenience sync, not a correctness-critical path.
/// Failures are recorded for an operator to act on.
#[async_trait]
pub trait NameserverPublisher: Send + Sync {
    /// Replace the domain's NS records with `nameservers`
    ///
    /// # Parameters
    ///
    /// - `domain`: The registered domain (e.g., "example.com")
    /// - `nameservers`: Authoritative nameservers, in order
    /// - `credentials`: Registrar API credentials
    async fn publish(
        &self,
        domain: &str,
        nameservers: &[String],
        credentials: &RegistrarCredentials,
    ) -> PublishOutcome;

    /// Get the registrar name (for logging/debugging)
    fn registrar_name(&self) -> &'static str;
}

/// Helper trait for constructing publishers from configuration
pub trait NameserverPublisherFactory: Send + Sync {
    /// Create a NameserverPublisher instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Registrar configuration
    /// - `audit`: Audit log the publisher writes through
    fn create(
        &self,
        config: &crate::config::RegistrarConfig,
        audit: std::sync::Arc<crate::AuditLog>,
    ) -> Result<Box<dyn NameserverPublisher>, crate::Error>;
}
