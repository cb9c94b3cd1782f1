//! Subcommand handlers for the `toolgate` binary.

pub mod args;
mod config;
mod policy;
mod simulate;

pub use args::{Cli, Commands};
pub use config::handle_config_command;
pub use policy::handle_policy_command;
pub use simulate::{SimulateOptions, handle_simulate_command};
