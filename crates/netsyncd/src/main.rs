// # netsyncd - Provisioning Hook
//
// ⚠️ ARCHITECTURAL CONSTRAINTS ⚠️
//
// - This is a THIN integration layer ONLY
// - DO NOT add lookup, retry or registrar logic here
// - Address discovery lives in netsync-ip-http, publication in the registrar crates
// - Configuration is via environment variables ONLY
//
// The netsyncd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Resolving the public address before any async runtime exists
// 3. Printing the resulting CIDR for the provisioning tooling
// 4. Publishing the zone's nameservers to the registrar, when asked to
//
// ## Configuration
//
// ### Address discovery
// - `NETSYNC_USE_CURRENT_IP`: Discover the public address (default true)
// - `NETSYNC_TIMEOUT_MS`: Per-attempt timeout in milliseconds (default 3000)
// - `NETSYNC_RETRY_PASSES`: Passes over the endpoint list (default 3)
// - `NETSYNC_ENDPOINTS`: Comma-separated lookup URLs (default built-ins)
// - `NETSYNC_PROXY`: Forward proxy for lookup requests
//
// ### Nameserver publication
// - `NETSYNC_DOMAIN`: Domain whose nameservers are published
// - `NETSYNC_NAMESERVERS`: Comma-separated authoritative nameservers
// - `NETSYNC_GODADDY_API_KEY` / `NETSYNC_GODADDY_API_SECRET`: Registrar credentials
// - `NETSYNC_AUDIT_LOG`: Audit log path (default logs/godaddy-api.log)
// - `NETSYNC_MODE`: `dry-run` logs the update instead of sending it
//
// ### Logging
// - `NETSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export NETSYNC_DOMAIN=example.com
// export NETSYNC_NAMESERVERS=ns-1.awsdns-01.org,ns-2.awsdns-02.net
// export NETSYNC_GODADDY_API_KEY=your_key
// export NETSYNC_GODADDY_API_SECRET=your_secret
//
// netsyncd
// # allowed_ip_address=203.0.113.7/32
// ```

use anyhow::Result;
use netsync_core::config::GODADDY_API_BASE;
use netsync_core::traits::RegistrarCredentials;
use netsync_core::{
    AuditLog, EndpointSpec, RegistrarConfig, RegistrarRegistry, ResolutionConfig,
    UNRESTRICTED_CIDR,
};
use netsync_ip_http::{AddressResolver, SyncBridge};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or startup error
/// - 2: Runtime error (including a resolution that outlived its bound; the
///   nameserver sync still runs first)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetsyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<NetsyncExitCode> for ExitCode {
    fn from(code: NetsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    use_current_ip: bool,
    timeout_ms: u64,
    retry_passes: usize,
    endpoints: Vec<String>,
    proxy: Option<String>,
    domain: Option<String>,
    nameservers: Vec<String>,
    credentials: RegistrarCredentials,
    audit_log: Option<String>,
    dry_run: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` (environment in production)
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            use_current_ip: match non_empty("NETSYNC_USE_CURRENT_IP") {
                Some(v) => parse_bool("NETSYNC_USE_CURRENT_IP", &v)?,
                None => true,
            },
            timeout_ms: match non_empty("NETSYNC_TIMEOUT_MS") {
                Some(v) => v.parse().map_err(|_| {
                    anyhow::anyhow!("NETSYNC_TIMEOUT_MS must be a number. Got: {}", v)
                })?,
                None => 3000,
            },
            retry_passes: match non_empty("NETSYNC_RETRY_PASSES") {
                Some(v) => v.parse().map_err(|_| {
                    anyhow::anyhow!("NETSYNC_RETRY_PASSES must be a number. Got: {}", v)
                })?,
                None => 3,
            },
            endpoints: split_list(non_empty("NETSYNC_ENDPOINTS")),
            proxy: non_empty("NETSYNC_PROXY"),
            domain: non_empty("NETSYNC_DOMAIN").map(|d| d.trim_end_matches('.').to_lowercase()),
            nameservers: split_list(non_empty("NETSYNC_NAMESERVERS")),
            credentials: RegistrarCredentials::new(
                lookup("NETSYNC_GODADDY_API_KEY").unwrap_or_default(),
                lookup("NETSYNC_GODADDY_API_SECRET").unwrap_or_default(),
            ),
            audit_log: non_empty("NETSYNC_AUDIT_LOG"),
            dry_run: non_empty("NETSYNC_MODE").is_some_and(|m| m.eq_ignore_ascii_case("dry-run")),
            log_level: non_empty("NETSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.timeout_ms) {
            anyhow::bail!(
                "NETSYNC_TIMEOUT_MS must be between 100 and 60000. Got: {}",
                self.timeout_ms
            );
        }

        if !(1..=10).contains(&self.retry_passes) {
            anyhow::bail!(
                "NETSYNC_RETRY_PASSES must be between 1 and 10. Got: {}",
                self.retry_passes
            );
        }

        self.resolution_config()
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid address discovery settings: {}", e))?;

        if let Some(ref domain) = self.domain {
            validate_domain_name(domain)?;

            for nameserver in &self.nameservers {
                validate_domain_name(nameserver)
                    .map_err(|e| anyhow::anyhow!("NETSYNC_NAMESERVERS: {}", e))?;
            }
        } else if !self.nameservers.is_empty() {
            anyhow::bail!(
                "NETSYNC_NAMESERVERS is set but NETSYNC_DOMAIN is not. \
                Set it via: export NETSYNC_DOMAIN=example.com"
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NETSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Address discovery options
    fn resolution_config(&self) -> ResolutionConfig {
        let mut config = ResolutionConfig::new()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_max_retry_passes(self.retry_passes);

        config.use_current_ip = self.use_current_ip;

        if !self.endpoints.is_empty() {
            config = config.with_endpoints(self.endpoints.iter().map(EndpointSpec::new).collect());
        }
        if let Some(ref proxy) = self.proxy {
            config = config.with_proxy(proxy.clone());
        }

        config
    }

    /// Registrar selection
    fn registrar_config(&self) -> RegistrarConfig {
        RegistrarConfig::GoDaddy {
            api_base: GODADDY_API_BASE.to_string(),
            dry_run: self.dry_run,
        }
    }

    fn audit_log(&self) -> AuditLog {
        match self.audit_log {
            Some(ref path) => AuditLog::new(path),
            None => AuditLog::default_location(),
        }
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be true or false. Got: {}", key, value),
    }
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Basic RFC 1035 domain name check
fn validate_domain_name(domain: &str) -> Result<()> {
    let domain = domain.trim_end_matches('.');

    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NetsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NetsyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NetsyncExitCode::ConfigError.into();
    }

    info!("Starting netsyncd");

    let registry = RegistrarRegistry::new();

    #[cfg(feature = "godaddy")]
    {
        info!("Registering GoDaddy registrar");
        netsync_registrar_godaddy::register(&registry);
    }

    // No runtime exists yet: the bridge brings its own
    run(&config, &registry, resolve_address).into()
}

/// Discover the address, then publish the nameservers
///
/// The sync does not depend on the address, so a failed discovery still lets
/// it run; the failure only decides the exit code.
fn run<F>(config: &Config, registry: &RegistrarRegistry, discover: F) -> NetsyncExitCode
where
    F: FnOnce(&ResolutionConfig) -> netsync_core::Result<String>,
{
    let mut exit = NetsyncExitCode::Success;

    match discover(&config.resolution_config()) {
        Ok(cidr) => println!("allowed_ip_address={}", cidr),
        Err(e) => {
            error!("Address discovery failed: {}", e);
            exit = NetsyncExitCode::RuntimeError;
        }
    }

    let Some(domain) = config.domain.as_deref() else {
        info!("NETSYNC_DOMAIN not set, skipping nameserver sync");
        return exit;
    };

    if config.nameservers.is_empty() {
        info!("NETSYNC_NAMESERVERS not set, skipping nameserver sync for {}", domain);
        return exit;
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NetsyncExitCode::RuntimeError;
        }
    };

    if let Err(e) = rt.block_on(sync_nameservers(config, registry, domain)) {
        error!("Nameserver sync error: {}", e);
        return NetsyncExitCode::RuntimeError;
    }

    exit
}

/// Resolve the public address through the blocking bridge
fn resolve_address(resolution: &ResolutionConfig) -> netsync_core::Result<String> {
    let resolver = match AddressResolver::with_reqwest() {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!("Failed to create HTTP client, using {}: {}", UNRESTRICTED_CIDR, e);
            return Ok(UNRESTRICTED_CIDR.to_string());
        }
    };

    SyncBridge::new(Arc::new(resolver)).resolve_blocking(resolution)
}

/// Publish the configured nameservers
///
/// Only a missing registrar is an error here: the publisher itself logs and
/// swallows every failure of the update.
async fn sync_nameservers(
    config: &Config,
    registry: &RegistrarRegistry,
    domain: &str,
) -> Result<()> {
    let audit = Arc::new(config.audit_log());
    let publisher = registry.create_publisher(&config.registrar_config(), Arc::clone(&audit))?;

    info!(
        "Syncing {} nameserver(s) for {} via {} (audit log: {})",
        config.nameservers.len(),
        domain,
        publisher.registrar_name(),
        audit.path().display()
    );

    let outcome = publisher
        .publish(domain, &config.nameservers, &config.credentials)
        .await;

    info!("Nameserver sync finished: {:?}", outcome);
    Ok(())
}
