//! TOML configuration. Every field has a default, so an empty file or no file
//! at all yields the settings for a 128x64 monochrome screen.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{EcLevel, QrResult, Version};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// QR version used for every payment code. Never upgraded automatically.
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(default)]
    pub ec_level: EcLevel,
    /// Saved entries file, `name|upi_id` per line.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_preview_extent")]
    pub preview_extent: usize,
    #[serde(default = "default_preview_top")]
    pub preview_top: usize,
    #[serde(default = "default_fullscreen_extent")]
    pub fullscreen_extent: usize,
    #[serde(default)]
    pub fullscreen_top: usize,
}

fn default_version() -> u8 {
    3
}

fn default_store_path() -> PathBuf {
    PathBuf::from("upi_qr/saved_upi.txt")
}

fn default_max_entries() -> usize {
    20
}

fn default_width() -> usize {
    128
}

fn default_height() -> usize {
    64
}

fn default_preview_extent() -> usize {
    55
}

fn default_preview_top() -> usize {
    5
}

fn default_fullscreen_extent() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            ec_level: EcLevel::default(),
            store_path: default_store_path(),
            max_entries: default_max_entries(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            preview_extent: default_preview_extent(),
            preview_top: default_preview_top(),
            fullscreen_extent: default_fullscreen_extent(),
            fullscreen_top: 0,
        }
    }
}

impl Config {
    /// The configured version, validated.
    ///
    /// # Errors
    ///
    /// Returns `Err(QrError::InvalidParameters)` outside 1..=40.
    pub fn qr_version(&self) -> QrResult<Version> {
        Version::new(self.version)
    }
}

/// Reads the configuration at `path`. A missing path gives the defaults; an
/// unreadable or malformed file is reported with `warn!` and also gives the
/// defaults.
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
            return Config::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(c) => c,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "failed to parse config, using defaults"
            );
            Config::default()
        }
    }
}
