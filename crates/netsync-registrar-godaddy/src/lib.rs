// # GoDaddy Nameserver Publication
//
// This crate pushes a hosted zone's authoritative nameservers to GoDaddy so
// the registrar delegates the domain to the new zone.
//
// ## Behaviour
//
// - ✅ One PUT per call, no retry (a one-time convenience sync)
// - ✅ Never fails visibly: every outcome is logged and `publish` returns
// - ✅ Full request/response paper trail in the audit log
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry or backoff (a failed sync is for an operator to redo)
// - ❌ NO background tasks
//
// ## Security Requirements
//
// - API key and secret NEVER appear in logs or Debug output
// - The audit log records the request body, which carries only nameservers
//
// ## API Reference
//
// - Replace records: PUT `/v1/domains/{domain}/records`
// - Auth header: `Authorization: sso-key {key}:{secret}`
// - The domain goes into the URL path, so only plain hostnames are accepted

use async_trait::async_trait;
use netsync_core::config::{GODADDY_API_BASE, RegistrarConfig};
use netsync_core::traits::{
    HttpRequest, HttpResponse, HttpTransport, NameserverPublisher, NameserverPublisherFactory,
    PublishOutcome, RegistrarCredentials,
};
use netsync_core::{AuditLog, Error, ReqwestTransport, Result};
use serde::Serialize;
use std::sync::Arc;

/// TTL given to every published NS record (in seconds)
const NS_RECORD_TTL: u32 = 3600;

/// One NS record change directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct NsRecord<'a> {
    name: &'static str,
    #[serde(rename = "type")]
    record_type: &'static str,
    data: &'a str,
    ttl: u32,
}

impl<'a> NsRecord<'a> {
    fn apex(nameserver: &'a str) -> Self {
        Self {
            name: "@",
            record_type: "NS",
            data: nameserver,
            ttl: NS_RECORD_TTL,
        }
    }
}

/// Serialize the NS record set for `nameservers`
fn ns_records_body(nameservers: &[String]) -> Result<String> {
    let records: Vec<NsRecord<'_>> = nameservers.iter().map(|ns| NsRecord::apex(ns)).collect();
    Ok(serde_json::to_string(&records)?)
}

/// Whether `domain` is a plain hostname that can go into the record URL path
fn is_valid_domain(domain: &str) -> bool {
    !domain.is_empty()
        && domain.len() <= 253
        && domain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

/// GoDaddy nameserver publisher
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the publisher checks its preconditions, builds and
/// audits the request body, and stops before sending anything.
pub struct GoDaddyRegistrar {
    /// Network seam
    transport: Arc<dyn HttpTransport>,

    /// Paper trail for every request and response
    audit: Arc<AuditLog>,

    /// API base URL
    api_base: String,

    /// Dry-run mode: if true, log the PUT instead of sending it
    dry_run: bool,
}

impl std::fmt::Debug for GoDaddyRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoDaddyRegistrar")
            .field("api_base", &self.api_base)
            .field("audit", &self.audit.path())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GoDaddyRegistrar {
    /// Create a publisher against the production API
    pub fn new(transport: Arc<dyn HttpTransport>, audit: Arc<AuditLog>) -> Self {
        Self {
            transport,
            audit,
            api_base: GODADDY_API_BASE.to_string(),
            dry_run: false,
        }
    }

    /// Create a publisher backed by reqwest
    pub fn with_reqwest(audit: Arc<AuditLog>) -> Result<Self> {
        Ok(Self::new(Arc::new(ReqwestTransport::new()?), audit))
    }

    /// Point at another API base (OTE environment, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Record-update endpoint for `domain`
    fn records_url(&self, domain: &str) -> String {
        format!("{}/v1/domains/{}/records", self.api_base, domain)
    }

    /// Append to the audit log; a failing log must not fail the publish
    async fn audit(&self, message: &str) {
        if let Err(e) = self.audit.append(message).await {
            tracing::warn!(
                "Failed to write audit log {}: {}",
                self.audit.path().display(),
                e
            );
        }
    }

    /// Log an error both to tracing and to the audit log
    async fn audit_error(&self, message: &str) {
        tracing::error!("{}", message);
        self.audit(&format!("ERROR: {}", message)).await;
    }

    async fn audit_response(&self, response: &HttpResponse) {
        let headers = serde_json::to_string_pretty(&response.headers_json())
            .unwrap_or_else(|_| "{}".to_string());

        self.audit(&format!(
            "Received response from GoDaddy API:\n  Status Code: {}\n  Headers: {}\n  Body: {}",
            response.status, headers, response.body
        ))
        .await;
    }
}

#[async_trait]
impl NameserverPublisher for GoDaddyRegistrar {
    async fn publish(
        &self,
        domain: &str,
        nameservers: &[String],
        credentials: &RegistrarCredentials,
    ) -> PublishOutcome {
        if !credentials.is_complete() {
            self.audit_error(&Error::CredentialMissing.to_string()).await;
            return PublishOutcome::Skipped("missing credentials".to_string());
        }

        if nameservers.is_empty() {
            self.audit_error(&Error::NoNameservers.to_string()).await;
            return PublishOutcome::Skipped("no nameservers".to_string());
        }

        if !is_valid_domain(domain) {
            self.audit_error(&Error::InvalidDomain(domain.to_string()).to_string())
                .await;
            return PublishOutcome::Skipped("invalid domain".to_string());
        }

        let body = match ns_records_body(nameservers) {
            Ok(body) => body,
            Err(e) => {
                self.audit_error(&format!("Error updating GoDaddy nameservers: {}", e))
                    .await;
                return PublishOutcome::Skipped("unserializable request".to_string());
            }
        };

        let url = self.records_url(domain);

        if self.dry_run {
            self.audit(&format!("[DRY-RUN] Sending request to GoDaddy API:\n{}", body))
                .await;
            tracing::info!("[DRY-RUN] Would send PUT request to {} with payload: {}", url, body);
            return PublishOutcome::DryRun;
        }

        self.audit(&format!("Sending request to GoDaddy API:\n{}", body))
            .await;

        tracing::info!(
            "Publishing {} nameserver(s) for {} to GoDaddy",
            nameservers.len(),
            domain
        );

        let request = HttpRequest::put(url, body)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header(
                "Authorization",
                format!("sso-key {}:{}", credentials.api_key, credentials.api_secret),
            );

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                let detail = match e {
                    Error::Transport(message) => message,
                    other => other.to_string(),
                };
                self.audit_error(&format!("Error updating GoDaddy nameservers: {}", detail))
                    .await;
                return PublishOutcome::TransportFailed;
            }
        };

        self.audit_response(&response).await;

        if response.status == 200 {
            let message = format!(
                "Successfully updated GoDaddy nameservers to: {}",
                nameservers.join(", ")
            );
            tracing::info!("{}", message);
            self.audit(&message).await;
            PublishOutcome::Published
        } else {
            let err = Error::remote_update("GoDaddy", response.status, &response.body);
            self.audit_error(&err.to_string()).await;
            PublishOutcome::Rejected {
                status: response.status,
            }
        }
    }

    fn registrar_name(&self) -> &'static str {
        "godaddy"
    }
}

/// Factory for creating GoDaddy publishers
pub struct GoDaddyFactory;

impl NameserverPublisherFactory for GoDaddyFactory {
    fn create(
        &self,
        config: &RegistrarConfig,
        audit: Arc<AuditLog>,
    ) -> Result<Box<dyn NameserverPublisher>> {
        match config {
            RegistrarConfig::GoDaddy { api_base, dry_run } => {
                if *dry_run {
                    tracing::warn!(
                        "GoDaddy registrar running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(
                    GoDaddyRegistrar::with_reqwest(audit)?
                        .with_api_base(api_base.clone())
                        .with_dry_run(*dry_run),
                ))
            }
            _ => Err(Error::config("Invalid config for GoDaddy registrar")),
        }
    }
}

/// Register the GoDaddy registrar with a registry
///
/// # Example
///
/// ```rust
/// use netsync_core::RegistrarRegistry;
///
/// let registry = RegistrarRegistry::new();
/// netsync_registrar_godaddy::register(&registry);
/// assert!(registry.has_registrar("godaddy"));
/// ```
pub fn register(registry: &netsync_core::RegistrarRegistry) {
    registry.register_registrar("godaddy", Box::new(GoDaddyFactory));
}
