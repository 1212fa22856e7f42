//! Plugin-based registrar registry
//!
//! The registry allows registrar implementations to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use netsync_core::registry::RegistrarRegistry;
//! use netsync_core::config::RegistrarConfig;
//!
//! let registry = RegistrarRegistry::new();
//! netsync_registrar_godaddy::register(&registry);
//!
//! let publisher = registry.create_publisher(&RegistrarConfig::default(), audit)?;
//! ```

use crate::AuditLog;
use crate::config::RegistrarConfig;
use crate::error::{Error, Result};
use crate::traits::{NameserverPublisher, NameserverPublisherFactory};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry for plugin-based registrar creation
///
/// Maps registrar type names to factory objects.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct RegistrarRegistry {
    registrars: RwLock<HashMap<String, Box<dyn NameserverPublisherFactory>>>,
}

impl RegistrarRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registrar factory
    ///
    /// # Parameters
    ///
    /// - `name`: Registrar type name (e.g., "godaddy")
    /// - `factory`: Factory object for creating publisher instances
    pub fn register_registrar(
        &self,
        name: impl Into<String>,
        factory: Box<dyn NameserverPublisherFactory>,
    ) {
        let mut registrars = self.registrars.write().unwrap_or_else(|e| e.into_inner());
        registrars.insert(name.into(), factory);
    }

    /// Create a publisher from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn NameserverPublisher>)`: Created publisher instance
    /// - `Err(Error)`: If the registrar type is not registered or creation fails
    pub fn create_publisher(
        &self,
        config: &RegistrarConfig,
        audit: Arc<AuditLog>,
    ) -> Result<Box<dyn NameserverPublisher>> {
        config.validate()?;

        let registrar_type = config.type_name();
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());

        let factory = registrars
            .get(registrar_type)
            .ok_or_else(|| Error::config(format!("Unknown registrar type: {}", registrar_type)))?;

        factory.create(config, audit)
    }

    /// List all registered registrar types
    pub fn list_registrars(&self) -> Vec<String> {
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());
        registrars.keys().cloned().collect()
    }

    /// Check if a registrar type is registered
    pub fn has_registrar(&self, name: &str) -> bool {
        let registrars = self.registrars.read().unwrap_or_else(|e| e.into_inner());
        registrars.contains_key(name)
    }
}
