//! Property tests for the behavior engine
//!
//! - Realized delay stays within the variance band and is exact at 0%
//! - 0% never injects a failure, 100% always does
//! - Equal seeds produce equal decision sequences

use aura_netsim::{BehaviorEngine, BehaviorSnapshot, RandomSource};
use proptest::prelude::*;
use std::time::Duration;

fn snapshot(delay_ms: u64, variance_percent: u32, failure_percent: u32) -> BehaviorSnapshot {
    BehaviorSnapshot {
        delay: Duration::from_millis(delay_ms),
        variance_percent,
        failure_percent,
        ..BehaviorSnapshot::default()
    }
}

proptest! {
    /// Property: delay lies in [delay * (1 - v), delay * (1 + v)]
    #[test]
    fn delay_within_variance_band(
        seed in any::<u64>(),
        delay_ms in 0u64..100_000,
        variance in 0u32..=100,
    ) {
        let engine = BehaviorEngine::new(RandomSource::seeded(seed));
        let config = snapshot(delay_ms, variance, 0);
        let base = config.delay.as_nanos();
        let lower = base * u128::from(100 - variance) / 100;
        let upper = base * u128::from(100 + variance) / 100;

        for _ in 0..16 {
            let realized = engine.decide(&config).delay_nanos();
            // One nanosecond of slack for float rounding at the band edges.
            prop_assert!(realized + 1 >= lower, "{} < {}", realized, lower);
            prop_assert!(realized <= upper + 1, "{} > {}", realized, upper);
        }
    }

    /// Property: zero variance reproduces the base delay exactly
    #[test]
    fn zero_variance_is_exact(seed in any::<u64>(), delay_ms in 0u64..1_000_000) {
        let engine = BehaviorEngine::new(RandomSource::seeded(seed));
        let config = snapshot(delay_ms, 0, 50);
        prop_assert_eq!(engine.decide(&config).delay, Duration::from_millis(delay_ms));
    }

    /// Property: failure edges never leak
    #[test]
    fn failure_edges(seed in any::<u64>()) {
        let engine = BehaviorEngine::new(RandomSource::seeded(seed));
        let never = snapshot(0, 0, 0);
        let always = snapshot(0, 0, 100);
        for _ in 0..64 {
            prop_assert!(!engine.decide(&never).forced_failure);
            prop_assert!(engine.decide(&always).forced_failure);
        }
    }

    /// Property: equal seeds give equal decision sequences
    #[test]
    fn seeded_decisions_reproduce(
        seed in any::<u64>(),
        variance in 0u32..=100,
        failure in 0u32..=100,
    ) {
        let a = BehaviorEngine::new(RandomSource::seeded(seed));
        let b = BehaviorEngine::new(RandomSource::seeded(seed));
        let config = snapshot(2_000, variance, failure);
        for _ in 0..32 {
            prop_assert_eq!(a.decide(&config), b.decide(&config));
        }
    }
}
