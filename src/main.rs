//! toolgate - operator CLI for the shared tool rate-admission gate
//!
//! Thin binary entry point that delegates to the handlers in `cli`.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;

mod cli;
mod main_helpers;

use cli::{Cli, Commands, SimulateOptions};
use main_helpers::{initialize_tracing, initialize_tracing_from_config, load_config};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // RUST_LOG wins over the [debug] section.
    let env_tracing = initialize_tracing();

    let manager = load_config(args.config.as_deref())?;
    let config = manager.config();

    if !env_tracing && config.debug.enable_tracing {
        initialize_tracing_from_config(&config.debug)?;
    }

    match args.command {
        Commands::Policy { key, json } => cli::handle_policy_command(config, &key, json),
        Commands::Config { json } => {
            cli::handle_config_command(config, manager.config_path(), json)
        }
        Commands::Simulate {
            tool,
            identity,
            calls,
            cost,
            interval_ms,
            json,
        } => {
            let options = SimulateOptions {
                tool,
                identity,
                calls,
                cost,
                interval: Duration::from_millis(interval_ms),
                json,
            };
            cli::handle_simulate_command(config, options).await
        }
    }
}
