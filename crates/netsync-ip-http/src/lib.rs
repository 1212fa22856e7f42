// # HTTP Address Discovery
//
// This crate discovers the caller's public address through third-party
// lookup services (ipify, ipinfo, ifconfig.me, ...).
//
// ## Purpose
//
// The provisioning process needs one CIDR to restrict access to the site
// while it is being built. The lookup services are unreliable, so the
// resolver walks a prioritized list, races every attempt against a timer,
// retries whole passes with backoff and caches successes for 15 minutes.
//
// ## Failure Policy
//
// Discovery never fails. When every service fails, the resolver returns
// `0.0.0.0/0` ("unrestricted") and leaves its cache empty so the next call
// tries again immediately.
//
// ## Blocking Callers
//
// `SyncBridge` serves call sites that run before any async runtime exists.
// It drives the resolver on a dedicated worker thread and bounds the wait;
// the bound is the only error it surfaces.

pub mod backoff;
pub mod bridge;
pub mod extract;
pub mod resolver;

pub use bridge::{DEFAULT_BRIDGE_GRACE, SyncBridge};
pub use resolver::{AddressResolver, Resolution};
