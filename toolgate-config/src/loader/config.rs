use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::debug::DebugConfig;
use crate::rate_limit::RateLimitConfig;

/// Main configuration structure for toolgate
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ToolgateConfig {
    /// Token-bucket admission policies
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Debug and tracing settings
    #[serde(default)]
    pub debug: DebugConfig,
}

impl ToolgateConfig {
    /// Parse a TOML document without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse toolgate configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.rate_limit
            .validate()
            .context("Invalid rate_limit configuration")?;
        Ok(())
    }

    /// Render the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize toolgate configuration")
    }
}
