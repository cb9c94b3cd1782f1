//! Debug and tracing configuration

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::Level;

/// Minimum severity for the config-driven subscriber, backed by a
/// [`tracing::Level`].
///
/// Names are matched case-insensitively and `warning` is accepted for `warn`.
/// An unrecognised name in a config file logs a warning and falls back to
/// `warn` instead of rejecting the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TraceLevel(Level);

impl TraceLevel {
    pub const ERROR: Self = Self(Level::ERROR);
    pub const WARN: Self = Self(Level::WARN);
    pub const INFO: Self = Self(Level::INFO);
    pub const DEBUG: Self = Self(Level::DEBUG);
    pub const TRACE: Self = Self(Level::TRACE);

    pub fn level(self) -> Level {
        self.0
    }

    /// Lowercase name as written in an `EnvFilter` directive.
    fn directive_name(self) -> &'static str {
        match self.0 {
            Level::ERROR => "error",
            Level::WARN => "warn",
            Level::INFO => "info",
            Level::DEBUG => "debug",
            _ => "trace",
        }
    }
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::WARN
    }
}

impl From<Level> for TraceLevel {
    fn from(level: Level) -> Self {
        Self(level)
    }
}

impl FromStr for TraceLevel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("warning") {
            return Ok(Self::WARN);
        }
        value
            .parse::<Level>()
            .map(Self)
            .map_err(|_| anyhow!("unknown trace level `{value}`"))
    }
}

impl From<String> for TraceLevel {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or_else(|err: anyhow::Error| {
            let fallback = Self::default();
            tracing::warn!(error = %err, %fallback, "Ignoring invalid [debug] trace_level");
            fallback
        })
    }
}

impl From<TraceLevel> for String {
    fn from(level: TraceLevel) -> Self {
        level.directive_name().to_string()
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive_name())
    }
}

/// Debug and tracing configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct DebugConfig {
    /// Enable structured logging to stderr
    #[serde(default)]
    pub enable_tracing: bool,

    /// Trace level (error, warn, info, debug, trace)
    #[serde(default)]
    pub trace_level: TraceLevel,

    /// Tracing targets to enable.
    /// Examples: "toolgate_core::rate_limit", "toolgate_core::tools"
    #[serde(default)]
    pub trace_targets: Vec<String>,
}

impl DebugConfig {
    /// Build an `EnvFilter`-compatible directive string such as
    /// `toolgate_core=debug,toolgate=debug`.
    pub fn filter_directive(&self, default_targets: &[&str]) -> String {
        let level = self.trace_level.directive_name();
        if self.trace_targets.is_empty() {
            default_targets
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        } else {
            self.trace_targets
                .iter()
                .map(|target| format!("{}={level}", target.trim()))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}
