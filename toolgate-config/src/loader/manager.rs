use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::loader::config::ToolgateConfig;
use crate::rate_limit::RateLimitConfig;
use crate::{CONFIG_FILE_NAME, env};

/// Configuration manager for loading and validating configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ToolgateConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default locations.
    ///
    /// `TOOLGATE_CONFIG_PATH` wins when set; otherwise `toolgate.toml` in the
    /// current directory is used if present, and built-in defaults if not.
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = std::env::var(env::CONFIG_PATH) {
            let trimmed = config_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_file(trimmed).with_context(|| {
                    format!(
                        "Failed to load configuration from {}={}",
                        env::CONFIG_PATH,
                        trimmed
                    )
                });
            }
        }

        Self::load_from_dir(std::env::current_dir()?)
    }

    /// Load `toolgate.toml` from a directory, falling back to defaults.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load_from_file(candidate)
        } else {
            tracing::debug!(
                dir = %dir.as_ref().display(),
                "No toolgate.toml found; using default configuration"
            );
            Self::from_config(ToolgateConfig::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = ToolgateConfig::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let mut manager = Self::from_config(config).with_context(|| {
            format!("Failed to validate config file: {}", path.display())
        })?;
        manager.config_path = Some(path.to_path_buf());
        Ok(manager)
    }

    /// Apply environment overrides to an in-memory configuration and validate it.
    pub fn from_config(mut config: ToolgateConfig) -> Result<Self> {
        apply_env_overrides(&mut config.rate_limit, |name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ToolgateConfig {
        &self.config
    }

    /// Get the configuration file path (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Overlay `TOOLGATE_RATE_*` values onto the default policy.
pub(crate) fn apply_env_overrides<F>(config: &mut RateLimitConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(capacity) = parse_env_f64(&lookup, env::RATE_CAPACITY)? {
        tracing::debug!(capacity, "Overriding rate_limit.capacity from environment");
        config.capacity = capacity;
    }
    if let Some(refill) = parse_env_f64(&lookup, env::RATE_REFILL_PER_SECOND)? {
        tracing::debug!(
            refill_per_second = refill,
            "Overriding rate_limit.refill_per_second from environment"
        );
        config.refill_per_second = refill;
    }
    Ok(())
}

fn parse_env_f64<F>(lookup: &F, name: &str) -> Result<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .with_context(|| format!("{name} must be a number (got `{trimmed}`)"))
}
