//! Behavior configuration
//!
//! [`BehaviorConfig`] is the live, mutable configuration shared by every call
//! made through one behavior. Reads go through [`BehaviorConfig::snapshot`] so
//! a single decision always sees one consistent set of fields even while a
//! test thread adjusts the configuration between invocations.
//!
//! [`BehaviorSettings`] is the serializable form used for TOML files and
//! environment overrides.

use crate::errors::{FailureCause, MockFailure, NetSimError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default base delay
pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);
/// Default variance percentage
pub const DEFAULT_VARIANCE_PERCENT: u32 = 40;
/// Default failure percentage
pub const DEFAULT_FAILURE_PERCENT: u32 = 3;

const MAX_PERCENT: u32 = 100;

/// Environment variable prefix for setting overrides
pub const ENV_PREFIX: &str = "AURA_NETSIM_";

/// Consistent view of the configuration used for one decision
#[derive(Debug, Clone)]
pub struct BehaviorSnapshot {
    /// Base delay before variance is applied
    pub delay: Duration,
    /// Variance around the base delay, in percent
    pub variance_percent: u32,
    /// Probability of an injected failure, in percent
    pub failure_percent: u32,
    /// Failure delivered when the engine forces a failure
    pub failure_exception: FailureCause,
}

impl Default for BehaviorSnapshot {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            variance_percent: DEFAULT_VARIANCE_PERCENT,
            failure_percent: DEFAULT_FAILURE_PERCENT,
            failure_exception: Arc::new(MockFailure::default()),
        }
    }
}

/// Thread-safe, mutable behavior configuration
#[derive(Debug, Default)]
pub struct BehaviorConfig {
    inner: RwLock<BehaviorSnapshot>,
}

impl BehaviorConfig {
    /// Create a configuration with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from explicit values, clamping percentages
    pub fn from_snapshot(snapshot: BehaviorSnapshot) -> Self {
        let config = Self::new();
        config.update(|current| *current = snapshot);
        config
    }

    /// Copy out the current configuration in one read
    pub fn snapshot(&self) -> BehaviorSnapshot {
        self.inner.read().clone()
    }

    /// Change several fields in one write.
    ///
    /// Readers see either the configuration before `apply` or the one after,
    /// never a mix. Percentages are clamped once `apply` returns.
    pub fn update(&self, apply: impl FnOnce(&mut BehaviorSnapshot)) {
        let mut inner = self.inner.write();
        apply(&mut inner);
        inner.variance_percent = clamp_percent("variance_percent", inner.variance_percent);
        inner.failure_percent = clamp_percent("failure_percent", inner.failure_percent);
    }

    /// Set the base delay
    pub fn set_delay(&self, delay: Duration) {
        self.inner.write().delay = delay;
    }

    /// The base delay
    pub fn delay(&self) -> Duration {
        self.inner.read().delay
    }

    /// Set the variance percentage, clamped to `[0, 100]`
    pub fn set_variance_percent(&self, percent: u32) {
        self.inner.write().variance_percent = clamp_percent("variance_percent", percent);
    }

    /// The variance percentage
    pub fn variance_percent(&self) -> u32 {
        self.inner.read().variance_percent
    }

    /// Set the failure percentage, clamped to `[0, 100]`
    pub fn set_failure_percent(&self, percent: u32) {
        self.inner.write().failure_percent = clamp_percent("failure_percent", percent);
    }

    /// The failure percentage
    pub fn failure_percent(&self) -> u32 {
        self.inner.read().failure_percent
    }

    /// Set the failure delivered when the engine forces a failure
    pub fn set_failure_exception(&self, failure: FailureCause) {
        self.inner.write().failure_exception = failure;
    }

    /// The failure delivered when the engine forces a failure
    pub fn failure_exception(&self) -> FailureCause {
        self.inner.read().failure_exception.clone()
    }
}

fn clamp_percent(field: &str, percent: u32) -> u32 {
    if percent > MAX_PERCENT {
        warn!(field, percent, "percentage out of range, clamping to 100");
        MAX_PERCENT
    } else {
        percent
    }
}

/// Serializable behavior settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Base delay in milliseconds
    pub delay_ms: u64,
    /// Variance around the base delay, in percent
    pub variance_percent: u32,
    /// Probability of an injected failure, in percent
    pub failure_percent: u32,
    /// Message of the injected failure; the default mock failure if unset
    pub failure_message: Option<String>,
    /// Seed for reproducible runs; entropy-seeded if unset
    pub seed: Option<u64>,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            variance_percent: DEFAULT_VARIANCE_PERCENT,
            failure_percent: DEFAULT_FAILURE_PERCENT,
            failure_message: None,
            seed: None,
        }
    }
}

impl BehaviorSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NetSimError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `AURA_NETSIM_*` overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `AURA_NETSIM_*` overrides from an explicit variable list
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match field {
                "DELAY_MS" => self.delay_ms = parse_field(field, value)?,
                "VARIANCE_PERCENT" => self.variance_percent = parse_field(field, value)?,
                "FAILURE_PERCENT" => self.failure_percent = parse_field(field, value)?,
                "SEED" => self.seed = Some(parse_field(field, value)?),
                "FAILURE_MESSAGE" => self.failure_message = Some(value.to_string()),
                _ => warn!(variable = key.as_ref(), "ignoring unknown netsim variable"),
            }
        }
        self.validate()
    }

    /// Reject percentages outside `[0, 100]`
    pub fn validate(&self) -> Result<()> {
        if self.variance_percent > MAX_PERCENT {
            return Err(NetSimError::invalid(format!(
                "variance_percent must be between 0 and 100 (got {})",
                self.variance_percent
            )));
        }
        if self.failure_percent > MAX_PERCENT {
            return Err(NetSimError::invalid(format!(
                "failure_percent must be between 0 and 100 (got {})",
                self.failure_percent
            )));
        }
        Ok(())
    }

    /// The configuration these settings describe
    pub fn to_snapshot(&self) -> BehaviorSnapshot {
        let failure = match &self.failure_message {
            Some(message) => MockFailure::new(message.clone()),
            None => MockFailure::default(),
        };
        BehaviorSnapshot {
            delay: Duration::from_millis(self.delay_ms),
            variance_percent: self.variance_percent,
            failure_percent: self.failure_percent,
            failure_exception: Arc::new(failure),
        }
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| NetSimError::invalid(format!("{ENV_PREFIX}{field}: cannot parse '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BehaviorConfig::new();
        assert_eq!(config.delay(), Duration::from_millis(2000));
        assert_eq!(config.variance_percent(), 40);
        assert_eq!(config.failure_percent(), 3);
        assert_eq!(config.failure_exception().to_string(), "Mock failure!");
    }

    #[test]
    fn test_percentages_are_clamped() {
        let config = BehaviorConfig::new();
        config.set_variance_percent(250);
        config.set_failure_percent(101);
        assert_eq!(config.variance_percent(), 100);
        assert_eq!(config.failure_percent(), 100);

        config.set_failure_percent(0);
        assert_eq!(config.failure_percent(), 0);
    }

    #[test]
    fn test_update_changes_fields_together() {
        let config = BehaviorConfig::new();
        let failure: FailureCause = Arc::new(MockFailure::new("grouped"));
        config.update(|snapshot| {
            snapshot.delay = Duration::from_millis(75);
            snapshot.variance_percent = 300;
            snapshot.failure_percent = 15;
            snapshot.failure_exception = failure.clone();
        });

        let snapshot = config.snapshot();
        assert_eq!(snapshot.delay, Duration::from_millis(75));
        assert_eq!(snapshot.variance_percent, 100);
        assert_eq!(snapshot.failure_percent, 15);
        assert!(Arc::ptr_eq(&snapshot.failure_exception, &failure));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let config = BehaviorConfig::new();
        config.set_delay(Duration::from_millis(100));
        let snapshot = config.snapshot();
        config.set_delay(Duration::from_millis(500));
        assert_eq!(snapshot.delay, Duration::from_millis(100));
        assert_eq!(config.delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_failure_exception_identity() {
        let config = BehaviorConfig::new();
        let failure: FailureCause = Arc::new(MockFailure::new("boom"));
        config.set_failure_exception(failure.clone());
        assert!(Arc::ptr_eq(&config.failure_exception(), &failure));
        assert!(Arc::ptr_eq(&config.snapshot().failure_exception, &failure));
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = BehaviorSettings::from_toml_str(
            r#"
            delay_ms = 100
            variance_percent = 0
            failure_percent = 25
            seed = 2847
            "#,
        )
        .unwrap();
        assert_eq!(settings.delay_ms, 100);
        assert_eq!(settings.variance_percent, 0);
        assert_eq!(settings.failure_percent, 25);
        assert_eq!(settings.seed, Some(2847));
        assert_eq!(settings.failure_message, None);
    }

    #[test]
    fn test_settings_partial_toml_uses_defaults() {
        let settings = BehaviorSettings::from_toml_str("failure_percent = 10").unwrap();
        assert_eq!(settings.delay_ms, 2000);
        assert_eq!(settings.variance_percent, 40);
        assert_eq!(settings.failure_percent, 10);
    }

    #[test]
    fn test_settings_reject_out_of_range() {
        let err = BehaviorSettings::from_toml_str("variance_percent = 101").unwrap_err();
        assert!(matches!(err, NetSimError::Invalid { .. }));

        let err = BehaviorSettings::from_toml_str("delay_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, NetSimError::Config { .. }));
    }

    #[test]
    fn test_settings_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netsim.toml");
        std::fs::write(&path, "delay_ms = 50\nfailure_message = \"Timeout!\"\n").unwrap();

        let settings = BehaviorSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.delay_ms, 50);
        assert_eq!(settings.to_snapshot().failure_exception.to_string(), "Timeout!");

        let missing = BehaviorSettings::load_from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(NetSimError::Config { .. })));
    }

    #[test]
    fn test_settings_env_overrides() {
        let mut settings = BehaviorSettings::default();
        settings
            .merge_with_vars([
                ("AURA_NETSIM_DELAY_MS", "150"),
                ("AURA_NETSIM_FAILURE_PERCENT", "100"),
                ("AURA_NETSIM_SEED", "9"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert_eq!(settings.delay_ms, 150);
        assert_eq!(settings.failure_percent, 100);
        assert_eq!(settings.seed, Some(9));

        let err = settings
            .merge_with_vars([("AURA_NETSIM_VARIANCE_PERCENT", "lots")])
            .unwrap_err();
        assert!(matches!(err, NetSimError::Invalid { .. }));
    }
}
