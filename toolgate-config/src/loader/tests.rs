use super::*;

use crate::env;
use crate::loader::manager::apply_env_overrides;
use crate::rate_limit::RateLimitConfig;
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    std::env::remove_var(env::CONFIG_PATH);
    std::env::remove_var(env::RATE_CAPACITY);
    std::env::remove_var(env::RATE_REFILL_PER_SECOND);
}

#[test]
#[serial]
fn load_from_file_reads_overrides() {
    clear_env();
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    writeln!(
        file,
        r#"
[rate_limit]
capacity = 60.0
refill_per_second = 1.0

[rate_limit.overrides."bash_tool:"]
capacity = 5.0
refill_per_second = 0.1

[debug]
enable_tracing = true
trace_level = "debug"
"#
    )
    .expect("failed to write config");

    let manager = ConfigManager::load_from_file(file.path()).expect("config should load");
    let config = manager.config();

    assert_eq!(config.rate_limit.capacity, 60.0);
    assert_eq!(config.rate_limit.refill_per_second, 1.0);
    assert_eq!(config.rate_limit.overrides.len(), 1);
    assert_eq!(config.rate_limit.overrides["bash_tool:"].capacity, 5.0);
    assert!(config.debug.enable_tracing);
    assert_eq!(manager.config_path(), Some(file.path()));
}

#[test]
#[serial]
fn load_from_dir_without_file_uses_defaults() {
    clear_env();
    let workspace = assert_fs::TempDir::new().expect("failed to create workspace");
    let manager = ConfigManager::load_from_dir(workspace.path()).expect("defaults should load");

    assert_eq!(manager.config(), &ToolgateConfig::default());
    assert!(manager.config_path().is_none());
}

#[test]
#[serial]
fn load_from_dir_picks_up_toolgate_toml() {
    clear_env();
    let workspace = assert_fs::TempDir::new().expect("failed to create workspace");
    fs::write(
        workspace.path().join(crate::CONFIG_FILE_NAME),
        "rate_limit.capacity = 12.0",
    )
    .expect("failed to write config");

    let manager = ConfigManager::load_from_dir(workspace.path()).expect("config should load");
    assert_eq!(manager.config().rate_limit.capacity, 12.0);
    assert_eq!(
        manager.config().rate_limit.refill_per_second,
        RateLimitConfig::default().refill_per_second
    );
}

#[test]
#[serial]
fn invalid_file_is_rejected_with_path_context() {
    clear_env();
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    writeln!(file, "[rate_limit]\ncapacity = -3.0").expect("failed to write config");

    let err = ConfigManager::load_from_file(file.path()).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("Failed to validate config file"));
    assert!(rendered.contains("rate_limit.capacity"));
}

#[test]
#[serial]
fn config_path_env_var_takes_precedence() {
    clear_env();
    let mut file = NamedTempFile::new().expect("failed to create temp config");
    writeln!(file, "rate_limit.capacity = 99.0").expect("failed to write config");
    std::env::set_var(env::CONFIG_PATH, file.path());

    let manager = ConfigManager::load().expect("config should load");
    clear_env();

    assert_eq!(manager.config().rate_limit.capacity, 99.0);
}

#[test]
#[serial]
fn environment_overrides_apply_after_file() {
    clear_env();
    std::env::set_var(env::RATE_CAPACITY, "7");
    std::env::set_var(env::RATE_REFILL_PER_SECOND, " 2.5 ");

    let manager = ConfigManager::from_config(ToolgateConfig::default());
    clear_env();

    let manager = manager.expect("overrides should validate");
    assert_eq!(manager.config().rate_limit.capacity, 7.0);
    assert_eq!(manager.config().rate_limit.refill_per_second, 2.5);
}

#[test]
fn malformed_override_is_an_error() {
    let mut config = RateLimitConfig::default();
    let err = apply_env_overrides(&mut config, |name| {
        (name == env::RATE_CAPACITY).then(|| "lots".to_string())
    })
    .unwrap_err();
    assert!(err.to_string().contains(env::RATE_CAPACITY));
}

#[test]
fn blank_override_is_ignored() {
    let mut config = RateLimitConfig::default();
    apply_env_overrides(&mut config, |_| Some("   ".to_string())).expect("blank is ignored");
    assert_eq!(config, RateLimitConfig::default());
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = ToolgateConfig::default();
    config.rate_limit.overrides.insert(
        "think:".to_string(),
        crate::PolicyOverride {
            capacity: 100.0,
            refill_per_second: 10.0,
            allow_fixed_allowance: false,
        },
    );
    let rendered = config.to_toml_string().expect("serialize");
    let parsed = ToolgateConfig::from_toml_str(&rendered).expect("parse");
    assert_eq!(parsed, config);
}
