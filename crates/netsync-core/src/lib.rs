// # netsync-core
//
// Core library for network self-description and registrar nameserver sync.
//
// ## Architecture Overview
//
// This library provides the shared building blocks used by the provisioning hook:
// - **AddressSource**: Trait for discovering the caller's public address as a CIDR
// - **NameserverPublisher**: Trait for pushing a zone's nameservers to a registrar
// - **HttpTransport**: Seam between the subsystems and the network (reqwest or a mock)
// - **AuditLog**: Append-only paper trail of outbound registrar traffic
// - **RegistrarRegistry**: Plugin-based registry for registrar implementations
//
// ## Design Principles
//
// 1. **Never abort provisioning**: Address discovery degrades to `0.0.0.0/0`,
//    nameserver publication logs and returns
// 2. **Explicit instances**: Resolvers own their cache, no process-wide singletons
// 3. **Plugin-Based**: Registrars are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All functionality can be used as a library

pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod traits;
pub mod transport;

// Re-export core types for convenience
pub use audit::AuditLog;
pub use cache::CachedAddress;
pub use config::{BackoffConfig, EndpointSpec, IpExtractor, RegistrarConfig, ResolutionConfig};
pub use error::{Error, Result};
pub use registry::RegistrarRegistry;
pub use traits::{AddressSource, HttpTransport, NameserverPublisher};
pub use transport::ReqwestTransport;

/// CIDR returned whenever the public address cannot (or must not) be determined.
///
/// Means "unrestricted / unknown".
pub const UNRESTRICTED_CIDR: &str = "0.0.0.0/0";
