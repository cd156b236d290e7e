//! Configuration for the memo store

use crate::error::{MemoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// What a memoized call does when it finds no cache context
///
/// Calls always run inside their own context, so this only matters if that
/// invariant is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContextPolicy {
    /// Run the function and return its result without caching it
    #[default]
    Recompute,

    /// Fail the call with `MemoError::ContextMissing`
    Fail,
}

impl FromStr for MissingContextPolicy {
    type Err = MemoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recompute" => Ok(MissingContextPolicy::Recompute),
            "fail" => Ok(MissingContextPolicy::Fail),
            other => Err(MemoError::ConfigError(format!(
                "unknown missing-context policy: {}",
                other
            ))),
        }
    }
}

/// Configuration for a memo store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoConfig {
    /// Life applied when neither the call nor a prior entry set one.
    /// `None` keeps such entries forever.
    pub default_life: Option<Duration>,

    /// Behaviour when a call runs without a cache context
    pub missing_context: MissingContextPolicy,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Interval for the background cleanup task
    pub cleanup_interval: Duration,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            default_life: None,
            missing_context: MissingContextPolicy::Recompute,
            enable_metrics: true,
            // Cleanup every 5 minutes
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl MemoConfig {
    /// Create a new builder for memo configuration
    pub fn builder() -> MemoConfigBuilder {
        MemoConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_life == Some(Duration::ZERO) {
            return Err(MemoError::ConfigError(
                "default_life must be greater than 0".to_string(),
            ));
        }

        if self.cleanup_interval.is_zero() {
            return Err(MemoError::ConfigError(
                "cleanup_interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from the environment (and `.env`, if present)
    ///
    /// Recognised variables:
    /// - `MEMO_DEFAULT_LIFE_SECS`
    /// - `MEMO_MISSING_CONTEXT` (`recompute` or `fail`)
    /// - `MEMO_ENABLE_METRICS` (`true` or `false`)
    /// - `MEMO_CLEANUP_INTERVAL_SECS`
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MEMO_DEFAULT_LIFE_SECS") {
            config.default_life = Some(Duration::from_secs(parse_var(
                "MEMO_DEFAULT_LIFE_SECS",
                &value,
            )?));
        }

        if let Some(value) = lookup("MEMO_MISSING_CONTEXT") {
            config.missing_context = value.parse()?;
        }

        if let Some(value) = lookup("MEMO_ENABLE_METRICS") {
            config.enable_metrics = parse_var("MEMO_ENABLE_METRICS", &value)?;
        }

        if let Some(value) = lookup("MEMO_CLEANUP_INTERVAL_SECS") {
            config.cleanup_interval = Duration::from_secs(parse_var(
                "MEMO_CLEANUP_INTERVAL_SECS",
                &value,
            )?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| MemoError::ConfigError(format!("invalid {}={:?}: {}", name, value, e)))
}

/// Builder for memo configuration
#[derive(Debug, Default)]
pub struct MemoConfigBuilder {
    default_life: Option<Duration>,
    missing_context: Option<MissingContextPolicy>,
    enable_metrics: Option<bool>,
    cleanup_interval: Option<Duration>,
}

impl MemoConfigBuilder {
    /// Set the fallback life for entries that never requested one
    pub fn default_life(mut self, life: Duration) -> Self {
        self.default_life = Some(life);
        self
    }

    /// Set the missing-context policy
    pub fn missing_context(mut self, policy: MissingContextPolicy) -> Self {
        self.missing_context = Some(policy);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the memo configuration
    pub fn build(self) -> MemoConfig {
        let defaults = MemoConfig::default();

        MemoConfig {
            default_life: self.default_life.or(defaults.default_life),
            missing_context: self.missing_context.unwrap_or(defaults.missing_context),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

/// Preset configurations
impl MemoConfig {
    /// Fail calls that lose their context instead of silently skipping the cache
    pub fn strict() -> Self {
        Self {
            missing_context: MissingContextPolicy::Fail,
            ..Default::default()
        }
    }

    /// Entries without an explicit life expire after 5 minutes
    pub fn short_lived() -> Self {
        Self {
            default_life: Some(Duration::from_secs(300)),
            cleanup_interval: Duration::from_secs(60),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = MemoConfig::default();
        assert_eq!(config.default_life, None);
        assert_eq!(config.missing_context, MissingContextPolicy::Recompute);
        assert!(config.enable_metrics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = MemoConfig::default();
        invalid.default_life = Some(Duration::ZERO);
        assert!(invalid.validate().is_err());

        let mut invalid = MemoConfig::default();
        invalid.cleanup_interval = Duration::ZERO;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = MemoConfig::builder()
            .default_life(Duration::from_secs(600))
            .missing_context(MissingContextPolicy::Fail)
            .enable_metrics(false)
            .build();

        assert_eq!(config.default_life, Some(Duration::from_secs(600)));
        assert_eq!(config.missing_context, MissingContextPolicy::Fail);
        assert!(!config.enable_metrics);
        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(MemoConfig::strict().missing_context, MissingContextPolicy::Fail);
        assert_eq!(
            MemoConfig::short_lived().default_life,
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "Recompute".parse::<MissingContextPolicy>().unwrap(),
            MissingContextPolicy::Recompute
        );
        assert_eq!(
            " fail ".parse::<MissingContextPolicy>().unwrap(),
            MissingContextPolicy::Fail
        );
        assert!("panic".parse::<MissingContextPolicy>().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = MemoConfig::from_lookup(lookup_from(&[
            ("MEMO_DEFAULT_LIFE_SECS", "90"),
            ("MEMO_MISSING_CONTEXT", "fail"),
            ("MEMO_ENABLE_METRICS", "false"),
            ("MEMO_CLEANUP_INTERVAL_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.default_life, Some(Duration::from_secs(90)));
        assert_eq!(config.missing_context, MissingContextPolicy::Fail);
        assert!(!config.enable_metrics);
        assert_eq!(config.cleanup_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = MemoConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.default_life, None);
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = MemoConfig::from_lookup(lookup_from(&[("MEMO_DEFAULT_LIFE_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, MemoError::ConfigError(_)));

        let err = MemoConfig::from_lookup(lookup_from(&[("MEMO_DEFAULT_LIFE_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("default_life"));
    }
}
