//! Configuration module for Perplexity-RS
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first settings file found (explicit path first),
/// then apply environment overrides and validate.
pub fn load(explicit: Option<PathBuf>) -> Result<Settings> {
    let mut settings = match find_settings_file(explicit) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };

    settings.merge_env()?;
    settings.validate()?;
    Ok(settings)
}

fn find_settings_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    // An explicitly requested file is used even if missing so the read error surfaces
    if explicit.is_some() {
        return explicit;
    }

    if let Ok(path) = std::env::var("PERPLEXITY_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut candidates = vec![PathBuf::from("perplexity.yml")];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("perplexity-rs/settings.yml"));
    }

    candidates.into_iter().find(|p| p.exists())
}
