use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token-bucket settings applied to every key whose prefix matches the
/// override's map key (for example `"bash_tool:"`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolicyOverride {
    /// Maximum tokens a bucket can hold (burst allowance).
    pub capacity: f64,
    /// Tokens restored per second.
    #[serde(default = "RateLimitConfig::default_refill_per_second")]
    pub refill_per_second: f64,
    /// Must be set to accept `refill_per_second = 0` ("N calls ever").
    #[serde(default)]
    pub allow_fixed_allowance: bool,
}

/// Rate-admission settings shared by every tool invocation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Default bucket capacity for keys without a matching override.
    #[serde(default = "RateLimitConfig::default_capacity")]
    pub capacity: f64,
    /// Default refill rate in tokens per second.
    #[serde(default = "RateLimitConfig::default_refill_per_second")]
    pub refill_per_second: f64,
    /// Must be set to accept a default `refill_per_second` of zero.
    #[serde(default)]
    pub allow_fixed_allowance: bool,
    /// Buckets untouched for this many seconds are dropped by the sweeper.
    #[serde(default = "RateLimitConfig::default_idle_ttl_seconds")]
    pub idle_ttl_seconds: u64,
    /// How often the idle sweeper runs (0 disables it).
    #[serde(default = "RateLimitConfig::default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    /// Per key-prefix policies. The longest matching prefix wins.
    #[serde(default)]
    pub overrides: IndexMap<String, PolicyOverride>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            refill_per_second: Self::default_refill_per_second(),
            allow_fixed_allowance: false,
            idle_ttl_seconds: Self::default_idle_ttl_seconds(),
            sweep_interval_seconds: Self::default_sweep_interval_seconds(),
            overrides: IndexMap::new(),
        }
    }
}

impl RateLimitConfig {
    const fn default_capacity() -> f64 {
        30.0
    }

    const fn default_refill_per_second() -> f64 {
        0.5
    }

    const fn default_idle_ttl_seconds() -> u64 {
        900
    }

    const fn default_sweep_interval_seconds() -> u64 {
        60
    }

    /// Idle time after which a bucket may be evicted.
    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_seconds)
    }

    /// Sweep period, or `None` when the sweeper is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.sweep_interval_seconds))
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_policy(
            "rate_limit",
            self.capacity,
            self.refill_per_second,
            self.allow_fixed_allowance,
        )?;

        ensure!(
            self.sweep_interval_seconds == 0 || self.idle_ttl_seconds > 0,
            "rate_limit.idle_ttl_seconds must be at least 1 when the sweeper is enabled"
        );

        for (prefix, policy) in &self.overrides {
            ensure!(
                !prefix.trim().is_empty(),
                "rate_limit.overrides keys must not be empty"
            );
            validate_policy(
                &format!("rate_limit.overrides.\"{prefix}\""),
                policy.capacity,
                policy.refill_per_second,
                policy.allow_fixed_allowance,
            )?;
        }

        Ok(())
    }
}

fn validate_policy(
    section: &str,
    capacity: f64,
    refill_per_second: f64,
    allow_fixed_allowance: bool,
) -> Result<()> {
    ensure!(
        capacity.is_finite() && capacity > 0.0,
        "{section}.capacity must be a positive number (got {capacity})"
    );
    ensure!(
        refill_per_second.is_finite() && refill_per_second >= 0.0,
        "{section}.refill_per_second must be zero or a positive number (got {refill_per_second})"
    );
    ensure!(
        refill_per_second > 0.0 || allow_fixed_allowance,
        "{section}.refill_per_second is 0; set allow_fixed_allowance = true for a one-shot allowance"
    );
    Ok(())
}
