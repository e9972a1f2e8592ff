//! # Configuration Module
//!
//! Loads and saves the user's curation settings. The engine itself never
//! reads files; the binary (or any embedding application) loads
//! [`Settings`] and hands the parts to the engine per call.
//!
//! ## Settings Storage
//!
//! Settings live in the platform-standard config directory:
//! - Linux: `~/.config/setlist/settings.json`
//! - macOS: `~/Library/Application Support/setlist/settings.json`
//! - Windows: `%APPDATA%\setlist\settings.json`
//!
//! Every field is optional in the file; missing ones take their defaults.

use crate::discovery::DiscoveryConfig;
use crate::filter::SmartFilterConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the platform-appropriate config directory for setlist.
///
/// Creates the `setlist` subdirectory if it doesn't exist.
///
/// # Errors
///
/// Returns an error if the system config directory cannot be determined or
/// the subdirectory cannot be created.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --settings <path> instead."
        )
    })?;

    let dir = base.join("setlist");
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create setlist config directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;

    Ok(dir)
}

/// Default location of the settings file
///
/// # Errors
///
/// See [`config_dir`].
pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.json"))
}

/// User-tunable curation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub filters: SmartFilterConfig,
    pub discovery: DiscoveryConfig,
}

impl Settings {
    /// Load settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Load from an explicit path, or from [`settings_path`] when none is given.
    ///
    /// # Errors
    ///
    /// See [`Settings::load`] and [`settings_path`].
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&settings_path()?),
        }
    }
}
