pub mod config;
pub mod manager;

pub use config::ToolgateConfig;
pub use manager::ConfigManager;

#[cfg(test)]
mod tests;
