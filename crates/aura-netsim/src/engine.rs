//! Randomized decision engine
//!
//! Turns one configuration snapshot into a concrete [`Decision`]: how long the
//! simulated call waits and whether the engine forces a failure. The engine
//! knows nothing about cancellation or execution mode.

use crate::config::BehaviorSnapshot;
use crate::random::RandomSource;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::trace;

/// Engine output for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Realized delay for this invocation
    pub delay: Duration,
    /// Whether the configured failure replaces the canned outcome
    pub forced_failure: bool,
}

impl Decision {
    /// Realized delay in nanoseconds
    pub fn delay_nanos(&self) -> u128 {
        self.delay.as_nanos()
    }
}

/// Decision engine backed by a seeded random source
#[derive(Debug)]
pub struct BehaviorEngine {
    random: Mutex<RandomSource>,
}

impl BehaviorEngine {
    /// Create an engine drawing from `random`
    pub fn new(random: RandomSource) -> Self {
        Self {
            random: Mutex::new(random),
        }
    }

    /// Seed of the underlying random source, if known
    pub fn seed(&self) -> Option<u64> {
        self.random.lock().seed()
    }

    /// Compute the delay and failure decision for one invocation.
    ///
    /// Both draws happen under one lock so concurrent callers consume the
    /// random sequence in whole decisions.
    pub fn decide(&self, config: &BehaviorSnapshot) -> Decision {
        let mut random = self.random.lock();
        let delay = realized_delay(&mut random, config.delay, config.variance_percent);
        let forced_failure = is_failure(&mut random, config.failure_percent);
        drop(random);

        trace!(
            delay_ms = delay.as_millis() as u64,
            forced_failure,
            "behavior decision"
        );
        Decision {
            delay,
            forced_failure,
        }
    }

    /// Draw only a delay
    pub fn calculate_delay(&self, config: &BehaviorSnapshot) -> Duration {
        realized_delay(&mut self.random.lock(), config.delay, config.variance_percent)
    }

    /// Draw only a failure decision
    pub fn calculate_is_failure(&self, config: &BehaviorSnapshot) -> bool {
        is_failure(&mut self.random.lock(), config.failure_percent)
    }
}

/// Uniform draw from `[delay * (1 - v), delay * (1 + v)]`, floored at zero
fn realized_delay(random: &mut RandomSource, delay: Duration, variance_percent: u32) -> Duration {
    if variance_percent == 0 {
        return delay;
    }
    let spread = f64::from(variance_percent.min(100)) / 100.0;
    let lower = 1.0 - spread;
    let factor = lower + random.next_unit() * (2.0 * spread);
    let nanos = (delay.as_nanos() as f64 * factor).floor();
    if nanos <= 0.0 {
        Duration::ZERO
    } else if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        // Beyond u64 nanoseconds; scale in seconds and saturate at the top.
        Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(Duration::MAX)
    }
}

/// `failure_percent` out of 100 draws fail; 0 never, 100 always
fn is_failure(random: &mut RandomSource, failure_percent: u32) -> bool {
    random.next_below(100) < failure_percent
}
