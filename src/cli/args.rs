use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect and exercise the toolgate rate-admission gate.
#[derive(Debug, Parser)]
#[command(name = "toolgate", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $TOOLGATE_CONFIG_PATH, then ./toolgate.toml)
    #[arg(long, short = 'c', global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show the policy that applies to a limiter key
    Policy {
        /// Limiter key, e.g. `bash_tool:anonymous`
        key: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and print the effective configuration
    Config {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Drive a burst of calls through the limiter and report the outcome
    Simulate {
        /// Tool name used for the limiter key
        #[arg(long)]
        tool: String,

        /// Caller identity used for the limiter key
        #[arg(long, default_value = "anonymous")]
        identity: String,

        /// Number of calls to issue
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        calls: u32,

        /// Tokens charged per call
        #[arg(long, default_value_t = 1.0)]
        cost: f64,

        /// Pause between calls, in milliseconds
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}
