//! Delay between resolution passes
//!
//! Jittered exponential backoff keeps repeated passes from hammering public
//! lookup services.

use netsync_core::BackoffConfig;
use std::time::Duration;

/// Delay to wait before pass `pass` (0-based)
///
/// The first pass never waits. Pass `n` waits
/// `min(base * 2^(n-1), max)` minus a random share of up to `jitter_factor`.
pub fn delay_before_pass(pass: usize, config: &BackoffConfig) -> Duration {
    if pass == 0 {
        return Duration::ZERO;
    }

    let exponent = (pass - 1).min(16) as u32;
    let capped_ms = config
        .base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_delay_ms);

    let jitter_factor = config.jitter_factor.clamp(0.0, 1.0);
    let jitter_ms = (capped_ms as f64 * jitter_factor * fastrand::f64()) as u64;

    Duration::from_millis(capped_ms.saturating_sub(jitter_ms))
}
