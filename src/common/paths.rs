use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for welt

/// Get the welt config directory
pub fn welt_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("welt");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the welt cache directory, home of the uploaded media handle cache
pub fn welt_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .context("Unable to determine cache directory for uploaded media")?
        .join("welt");

    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("creating cache directory at {}", cache_dir.display()))?;

    Ok(cache_dir)
}
