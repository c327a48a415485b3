//! Shared helpers for the hoist binary.

use std::path::PathBuf;

use anyhow::{bail, Context};

pub mod history;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

/// Resolve the hoist config directory: the `--home` flag, then the
/// HOIST_HOME environment variable, then `<config dir>/hoist`.
pub fn config_home(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(home) = flag {
        return Ok(home);
    }
    if let Ok(home) = std::env::var("HOIST_HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    dirs::config_dir()
        .map(|dir| dir.join("hoist"))
        .context("No config directory for this platform; pass --home")
}

/// Parse one `key=value` backend option.
pub fn parse_key_value(raw: &str) -> anyhow::Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("invalid option `{raw}`, expected key=value"),
    }
}
