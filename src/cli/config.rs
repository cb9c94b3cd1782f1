use anyhow::Result;
use std::path::Path;
use toolgate_config::ToolgateConfig;

/// Print the validated configuration, noting where it came from.
pub fn handle_config_command(
    config: &ToolgateConfig,
    source: Option<&Path>,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    match source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# built-in defaults"),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}
