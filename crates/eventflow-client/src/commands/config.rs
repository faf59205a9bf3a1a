//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig, source: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", source.display());
    println!("{}", toml_str);
    Ok(())
}

/// Show the configuration and credential file paths.
pub fn path(config: &ClientConfig, source: &Path) -> ClientResult<()> {
    println!("config: {}", source.display());
    println!("credential: {}", config.credential_path().display());
    Ok(())
}
