//! Settings files. A TOML file holds any subset of [`GlobalSettings`];
//! missing keys keep their defaults.
//!
//! ```toml
//! gap_policy = "allow"
//! stress_step_m = 0.25
//! ags_error_policy = "skip_and_report"
//! ```

use crate::error::{CliError, Result};
use ground_core::GlobalSettings;
use std::path::Path;
use tracing::debug;

pub fn load_settings(path: &Path) -> Result<GlobalSettings> {
    let content = std::fs::read_to_string(path)?;
    let settings = parse_settings(&content).map_err(|source| CliError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    debug!("Loaded settings from {}: {:?}", path.display(), settings);
    Ok(settings)
}

fn parse_settings(content: &str) -> std::result::Result<GlobalSettings, toml::de::Error> {
    toml::from_str(content)
}

/// Settings in effect: the `--config` file if given, else `fallback`.
pub fn resolve(config: Option<&Path>, fallback: &GlobalSettings) -> Result<GlobalSettings> {
    match config {
        Some(path) => load_settings(path),
        None => Ok(fallback.clone()),
    }
}
