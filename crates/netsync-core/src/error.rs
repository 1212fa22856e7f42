//! Error types for the netsync subsystems
//!
//! Most of these never leave the crate boundary: the address resolver and the
//! nameserver publisher recover from them internally. The only variant callers
//! are expected to handle is [`Error::BridgeTimeout`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for netsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the netsync subsystems
#[derive(Error, Debug)]
pub enum Error {
    /// A lookup endpoint did not answer within the per-attempt timeout
    #[error("Timeout after {timeout_ms}ms waiting for {endpoint}")]
    EndpointTimeout {
        /// Endpoint URL
        endpoint: String,
        /// Per-attempt timeout that elapsed
        timeout_ms: u64,
    },

    /// A lookup endpoint answered but no address could be extracted
    #[error("Failed to parse address from {endpoint}: {message}")]
    EndpointParse {
        /// Endpoint URL
        endpoint: String,
        /// What was wrong with the response
        message: String,
    },

    /// Every endpoint failed on every pass
    #[error("All endpoints failed after {passes} pass(es) and {attempts} attempt(s)")]
    AllEndpointsExhausted {
        /// Passes completed
        passes: usize,
        /// Individual endpoint attempts made
        attempts: usize,
    },

    /// The blocking bridge gave up waiting for the resolver
    #[error("Timeout exceeded {}ms waiting for address resolution", .waited.as_millis())]
    BridgeTimeout {
        /// How long the caller was blocked
        waited: Duration,
    },

    /// Registrar API key or secret was not provided
    #[error("API key or secret is missing!")]
    CredentialMissing,

    /// No nameservers were given to publish
    #[error("No nameservers provided for update!")]
    NoNameservers,

    /// The domain cannot be placed in a registrar request path
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// The registrar answered with a non-success status
    #[error("Failed to update {registrar} nameservers: {body}")]
    RemoteUpdate {
        /// Registrar display name
        registrar: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Connection, TLS or protocol failure below the HTTP status level
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local I/O errors (audit log)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an endpoint timeout error
    pub fn endpoint_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self::EndpointTimeout {
            endpoint: endpoint.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Create an endpoint parse error
    pub fn endpoint_parse(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EndpointParse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a bridge timeout error
    pub fn bridge_timeout(waited: Duration) -> Self {
        Self::BridgeTimeout { waited }
    }

    /// Create a remote update error
    pub fn remote_update(registrar: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::RemoteUpdate {
            registrar,
            status,
            body: body.into(),
        }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

}
