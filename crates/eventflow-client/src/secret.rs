//! Secret reference resolver.
//!
//! Passwords given on the command line or through the environment can point
//! at a secret stored elsewhere:
//!
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used as typed

use crate::error::{ClientError, ClientResult};

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> ClientResult<String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else {
        Ok(value.to_string())
    }
}

fn resolve_pass(path: &str) -> ClientResult<String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| ClientError::Secret(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClientError::Secret(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Secret(format!("`pass show {}` produced no output", path)))
}

fn resolve_env(var: &str) -> ClientResult<String> {
    std::env::var(var)
        .map_err(|_| ClientError::Secret(format!("environment variable `{}` is not set", var)))
}
