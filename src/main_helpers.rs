use anyhow::{Context, Result};
use std::path::Path;
use toolgate_config::{ConfigManager, DebugConfig};

const DEFAULT_TRACE_TARGETS: &[&str] = &["toolgate_core", "toolgate_config", "toolgate"];

/// Initialize tracing from `RUST_LOG` when it is set. Returns whether a
/// subscriber was installed.
pub(crate) fn initialize_tracing() -> bool {
    // Check if RUST_LOG env var is set (takes precedence)
    if std::env::var_os("RUST_LOG").is_none() {
        return false;
    }

    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping env tracing setup");
    }
    true
}

/// Initialize tracing from the `[debug]` section of the configuration.
pub(crate) fn initialize_tracing_from_config(debug_cfg: &DebugConfig) -> Result<()> {
    let directive = debug_cfg.filter_directive(DEFAULT_TRACE_TARGETS);
    let env_filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid trace filter `{directive}` in [debug] config"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();

    if let Err(err) = init_result {
        tracing::warn!(error = %err, "tracing already initialized; skipping config tracing setup");
    }
    Ok(())
}

/// Load configuration from an explicit path, or from the default locations.
pub(crate) fn load_config(path: Option<&Path>) -> Result<ConfigManager> {
    match path {
        Some(path) => ConfigManager::load_from_file(path),
        None => ConfigManager::load(),
    }
}
