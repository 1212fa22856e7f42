//! Contract Test: Address Resolution
//!
//! Constraints verified:
//! - Disabled discovery never touches the network
//! - Successes are cached for the TTL, failures are never cached
//! - Passes are bounded and walk the endpoints in priority order
//! - A hanging endpoint loses to its timer and its request is dropped
//! - Every injected fault degrades to 0.0.0.0/0 instead of escaping
//!
//! Time is paused in these tests; timers fire as soon as the runtime idles.

mod common;

use common::*;
use netsync_core::{BackoffConfig, EndpointSpec, IpExtractor, ResolutionConfig};
use netsync_ip_http::{AddressResolver, Resolution};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const ADDRESS: &str = r#"{"ip": "203.0.113.7"}"#;

fn resolver(transport: &Arc<MockTransport>) -> AddressResolver {
    AddressResolver::new(Arc::clone(transport) as Arc<dyn netsync_core::HttpTransport>)
}

#[tokio::test(start_paused = true)]
async fn disabled_discovery_makes_no_requests() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = resolver(&transport);

    let resolution = resolver.resolve_detailed(&ResolutionConfig::disabled()).await;

    assert_eq!(resolution, Resolution::Disabled);
    assert_eq!(resolution.cidr(), "0.0.0.0/0");
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_call_within_ttl_is_served_from_cache() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = resolver(&transport);
    let config = test_config();

    let first = resolver.resolve_detailed(&config).await;
    tokio::time::advance(Duration::from_secs(14 * 60)).await;
    let second = resolver.resolve_detailed(&config).await;

    assert_eq!(first.cidr(), "203.0.113.7/32");
    assert_eq!(second, Resolution::Cached("203.0.113.7/32".to_string()));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn call_after_ttl_fetches_again() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::json(ADDRESS))
            .on(IPIFY, Reply::json(r#"{"ip": "203.0.113.8"}"#)),
    );
    let resolver = resolver(&transport);
    let config = test_config();

    assert_eq!(resolver.resolve_detailed(&config).await.cidr(), "203.0.113.7/32");

    tokio::time::advance(Duration::from_secs(15 * 60)).await;
    assert_eq!(resolver.cached().await, None);

    assert_eq!(resolver.resolve_detailed(&config).await.cidr(), "203.0.113.8/32");
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn custom_ttl_is_honoured() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = resolver(&transport).with_cache_ttl(Duration::from_secs(5));
    let config = test_config();

    resolver.resolve_detailed(&config).await;
    tokio::time::advance(Duration::from_secs(6)).await;
    resolver.resolve_detailed(&config).await;

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_later_pass() {
    // ipify fails on passes 1 and 2, answers on pass 3
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::refused())
            .on(IPIFY, Reply::status(503, "busy"))
            .on(IPIFY, Reply::json(ADDRESS))
            .on(IPINFO, Reply::refused())
            .on(IFCONFIG, Reply::json("not json")),
    );
    let resolver = resolver(&transport);
    let config = test_config();

    let resolution = resolver.resolve_detailed(&config).await;

    assert_eq!(
        resolution,
        Resolution::Resolved {
            cidr: "203.0.113.7/32".to_string(),
            endpoint: IPIFY.to_string(),
            attempts: 7,
        }
    );
    assert!(transport.call_count() <= config.max_retry_passes * config.endpoints.len());
    assert_eq!(transport.calls_to(IPIFY), 3);
    assert_eq!(transport.calls_to(IPINFO), 2);
}

#[tokio::test(start_paused = true)]
async fn endpoints_are_tried_in_priority_order() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::status(500, "oops"))
            .on(IPINFO, Reply::json(r#"{"ip": "198.51.100.4", "city": "Utrecht"}"#))
            .on(IFCONFIG, Reply::json(r#"{"ip_addr": "192.0.2.1"}"#)),
    );
    let resolver = resolver(&transport);

    let resolution = resolver.resolve_detailed(&test_config()).await;

    assert_eq!(resolution.cidr(), "198.51.100.4/32");
    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec![IPIFY.to_string(), IPINFO.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn ifconfig_field_is_read() {
    let transport = Arc::new(
        MockTransport::new().on(IFCONFIG, Reply::json(r#"{"ip_addr": "192.0.2.1"}"#)),
    );
    let resolver = resolver(&transport);

    let resolution = resolver.resolve_detailed(&test_config()).await;

    assert_eq!(resolution.cidr(), "192.0.2.1/32");
}

#[tokio::test(start_paused = true)]
async fn all_failing_returns_sentinel_and_is_not_cached() {
    let transport = Arc::new(MockTransport::new());
    let resolver = resolver(&transport);
    let config = test_config();

    let first = resolver.resolve_detailed(&config).await;

    assert_eq!(first, Resolution::Fallback { attempts: 9 });
    assert_eq!(first.cidr(), "0.0.0.0/0");
    assert_eq!(transport.call_count(), 9);
    assert_eq!(resolver.cached().await, None);

    // The very next call goes back to the network
    let second = resolver.resolve_detailed(&config).await;
    assert!(second.is_fallback());
    assert_eq!(transport.call_count(), 18);
}

#[tokio::test(start_paused = true)]
async fn failure_after_success_keeps_cache_until_expiry() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::json(ADDRESS))
            .on(IPIFY, Reply::refused()),
    );
    let resolver = resolver(&transport);
    let config = test_config();

    resolver.resolve_detailed(&config).await;
    tokio::time::advance(Duration::from_secs(15 * 60)).await;

    let after_expiry = resolver.resolve_detailed(&config).await;

    assert!(after_expiry.is_fallback());
    assert_eq!(resolver.cached().await, None);
}

#[tokio::test(start_paused = true)]
async fn prefixed_address_is_returned_unchanged() {
    let transport = Arc::new(
        MockTransport::new().on(IPIFY, Reply::json(r#"{"ip": "203.0.113.0/24"}"#)),
    );
    let resolver = resolver(&transport);

    assert_eq!(resolver.resolve_detailed(&test_config()).await.cidr(), "203.0.113.0/24");
}

#[tokio::test(start_paused = true)]
async fn ipv6_answer_is_rejected_and_next_endpoint_used() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::json(r#"{"ip": "2001:db8::1"}"#))
            .on(IPINFO, Reply::json(r#"{"ip": "2001:db8::/64"}"#))
            .on(IFCONFIG, Reply::json(r#"{"ip_addr": "198.51.100.4"}"#)),
    );
    let resolver = resolver(&transport);

    let resolution = resolver.resolve_detailed(&test_config()).await;

    assert_eq!(
        resolution,
        Resolution::Resolved {
            cidr: "198.51.100.4/32".to_string(),
            endpoint: IFCONFIG.to_string(),
            attempts: 3,
        }
    );
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn ipv6_only_answers_degrade_to_sentinel() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::json(r#"{"ip": "2001:db8::1"}"#))
            .on(IPINFO, Reply::json(r#"{"ip": "2001:db8::1"}"#))
            .on(IFCONFIG, Reply::json(r#"{"ip_addr": "2001:db8::1"}"#)),
    );
    let resolver = resolver(&transport);

    let resolution = resolver.resolve_detailed(&test_config()).await;

    assert_eq!(resolution.into_cidr(), "0.0.0.0/0");
    assert!(resolver.cached().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn hanging_endpoint_loses_to_timer_and_is_dropped() {
    let transport = Arc::new(
        MockTransport::new()
            .on(IPIFY, Reply::Hang)
            .on(IPINFO, Reply::json(ADDRESS)),
    );
    let resolver = resolver(&transport);
    let config = test_config();
    let started = Instant::now();

    let resolution = resolver.resolve_detailed(&config).await;

    assert_eq!(resolution.cidr(), "203.0.113.7/32");
    assert_eq!(transport.abandoned_count(), 1);
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert!(started.elapsed() < Duration::from_millis(3100));
}

#[tokio::test(start_paused = true)]
async fn every_fault_degrades_to_sentinel() {
    let faults = vec![
        ("timeout", Reply::Hang),
        ("malformed body", Reply::json("<html>502 Bad Gateway</html>")),
        ("missing field", Reply::json(r#"{"address": "203.0.113.7"}"#)),
        ("not an address", Reply::json(r#"{"ip": "undefined"}"#)),
        ("connection refused", Reply::refused()),
        ("server error", Reply::status(500, "internal error")),
    ];

    for (name, fault) in faults {
        let transport = Arc::new(MockTransport::new().on(IPIFY, fault));
        let resolver = resolver(&transport);
        let config = test_config()
            .with_endpoints(vec![EndpointSpec::new(IPIFY)])
            .with_max_retry_passes(2);

        let resolution = resolver.resolve_detailed(&config).await;

        assert_eq!(resolution, Resolution::Fallback { attempts: 2 }, "fault: {}", name);
        assert_eq!(transport.call_count(), 2, "fault: {}", name);
    }
}

#[tokio::test(start_paused = true)]
async fn unrecognized_endpoint_is_skipped_without_a_request() {
    let unknown = "https://whoami.example.net/";
    let custom = "https://lookup.example.net/v1";
    let transport = Arc::new(
        MockTransport::new()
            .on(unknown, Reply::json(ADDRESS))
            .on(custom, Reply::json(r#"{"address": "192.0.2.55"}"#)),
    );
    let resolver = resolver(&transport);
    let config = test_config().with_endpoints(vec![
        EndpointSpec::new(unknown),
        EndpointSpec::with_extractor(custom, IpExtractor::JsonField("address".to_string())),
    ]);

    let resolution = resolver.resolve_detailed(&config).await;

    assert_eq!(
        resolution,
        Resolution::Resolved {
            cidr: "192.0.2.55/32".to_string(),
            endpoint: custom.to_string(),
            attempts: 2,
        }
    );
    assert_eq!(transport.calls_to(unknown), 0);
}

#[tokio::test(start_paused = true)]
async fn proxy_applies_to_every_request_in_every_pass() {
    let proxy = "http://proxy.internal:3128";
    let transport = Arc::new(MockTransport::new());
    let resolver = resolver(&transport);
    let config = test_config().with_proxy(proxy);

    resolver.resolve_detailed(&config).await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 9);
    assert!(requests.iter().all(|r| r.proxy.as_deref() == Some(proxy)));
}

#[tokio::test(start_paused = true)]
async fn requests_are_direct_without_proxy() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = resolver(&transport);

    resolver.resolve_detailed(&test_config()).await;

    let request = &transport.requests()[0];
    assert_eq!(request.proxy, None);
    assert!(
        request
            .header_value("User-Agent")
            .is_some_and(|ua| ua.starts_with("netsync-ip-helper/"))
    );
}

#[tokio::test(start_paused = true)]
async fn passes_are_separated_by_backoff() {
    let transport = Arc::new(MockTransport::new());
    let resolver = resolver(&transport);
    let config = test_config().with_backoff(BackoffConfig::deterministic(100, 2000));
    let started = Instant::now();

    resolver.resolve_detailed(&config).await;

    // 100ms before pass 2, 200ms before pass 3
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_share_one_fetch() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = Arc::new(resolver(&transport));
    let config = test_config();

    let (a, b) = tokio::join!(
        resolver.resolve_detailed(&config),
        resolver.resolve_detailed(&config)
    );

    assert_eq!(a.cidr(), "203.0.113.7/32");
    assert_eq!(b.cidr(), "203.0.113.7/32");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn clear_cache_forces_refetch() {
    let transport = Arc::new(MockTransport::new().on(IPIFY, Reply::json(ADDRESS)));
    let resolver = resolver(&transport);
    let config = test_config();

    resolver.resolve_detailed(&config).await;
    resolver.clear_cache().await;
    resolver.resolve_detailed(&config).await;

    assert_eq!(transport.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn trait_surface_returns_plain_cidr() {
    use netsync_core::AddressSource;

    let transport = Arc::new(MockTransport::new());
    let resolver = resolver(&transport);
    let config = test_config().with_max_retry_passes(1);

    assert_eq!(resolver.resolve(&config).await, "0.0.0.0/0");
    assert_eq!(resolver.source_name(), "http");
}
