//! Network behavior facade
//!
//! Pairs the live [`BehaviorConfig`] with its [`BehaviorEngine`]. One
//! behavior is normally shared (behind an `Arc`) by every call created through
//! a [`crate::MockNetwork`], so a test can adjust delay and failure rates
//! between invocations.

use crate::config::{BehaviorConfig, BehaviorSettings, BehaviorSnapshot};
use crate::engine::{BehaviorEngine, Decision};
use crate::errors::{FailureCause, Result};
use crate::random::RandomSource;
use std::time::Duration;
use tracing::debug;

/// Simulated network conditions: latency, variance and failure rate
#[derive(Debug)]
pub struct NetworkBehavior {
    config: BehaviorConfig,
    engine: BehaviorEngine,
}

impl NetworkBehavior {
    /// Create a behavior with default configuration drawing from `random`
    pub fn new(random: RandomSource) -> Self {
        Self::with_config(BehaviorConfig::new(), random)
    }

    /// Create a behavior from an explicit configuration
    pub fn with_config(config: BehaviorConfig, random: RandomSource) -> Self {
        Self {
            config,
            engine: BehaviorEngine::new(random),
        }
    }

    /// Create a reproducible behavior
    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomSource::seeded(seed))
    }

    /// Create a behavior seeded from operating system entropy
    pub fn from_entropy() -> Self {
        Self::new(RandomSource::from_entropy())
    }

    /// Build a behavior from validated settings
    pub fn from_settings(settings: &BehaviorSettings) -> Result<Self> {
        settings.validate()?;
        let random = match settings.seed {
            Some(seed) => RandomSource::seeded(seed),
            None => RandomSource::from_entropy(),
        };
        debug!(
            delay_ms = settings.delay_ms,
            variance_percent = settings.variance_percent,
            failure_percent = settings.failure_percent,
            seed = ?settings.seed,
            "network behavior configured"
        );
        Ok(Self::with_config(
            BehaviorConfig::from_snapshot(settings.to_snapshot()),
            random,
        ))
    }

    /// The live configuration
    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Consistent copy of the current configuration
    pub fn snapshot(&self) -> BehaviorSnapshot {
        self.config.snapshot()
    }

    /// Set the base delay
    pub fn set_delay(&self, delay: Duration) {
        self.config.set_delay(delay);
    }

    /// The base delay
    pub fn delay(&self) -> Duration {
        self.config.delay()
    }

    /// Set the variance percentage, clamped to `[0, 100]`
    pub fn set_variance_percent(&self, percent: u32) {
        self.config.set_variance_percent(percent);
    }

    /// The variance percentage
    pub fn variance_percent(&self) -> u32 {
        self.config.variance_percent()
    }

    /// Set the failure percentage, clamped to `[0, 100]`
    pub fn set_failure_percent(&self, percent: u32) {
        self.config.set_failure_percent(percent);
    }

    /// The failure percentage
    pub fn failure_percent(&self) -> u32 {
        self.config.failure_percent()
    }

    /// Set the failure injected by the engine
    pub fn set_failure_exception(&self, failure: FailureCause) {
        self.config.set_failure_exception(failure);
    }

    /// The failure injected by the engine
    pub fn failure_exception(&self) -> FailureCause {
        self.config.failure_exception()
    }

    /// Draw a realized delay from the current configuration
    pub fn calculate_delay(&self) -> Duration {
        self.engine.calculate_delay(&self.config.snapshot())
    }

    /// Draw a failure decision from the current configuration
    pub fn calculate_is_failure(&self) -> bool {
        self.engine.calculate_is_failure(&self.config.snapshot())
    }

    /// Snapshot the configuration and decide one invocation.
    ///
    /// The snapshot is returned alongside the decision so the caller resolves
    /// an injected failure against the same configuration it decided with.
    pub fn decide(&self) -> (Decision, BehaviorSnapshot) {
        let snapshot = self.config.snapshot();
        let decision = self.engine.decide(&snapshot);
        (decision, snapshot)
    }
}

impl Default for NetworkBehavior {
    fn default() -> Self {
        Self::from_entropy()
    }
}
