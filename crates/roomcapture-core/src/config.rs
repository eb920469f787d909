//! Runtime configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default, so an empty object (or no file at all) is a valid configuration.

use crate::pointer::{DEFAULT_LONG_PRESS, DEFAULT_TAP_SLOP, GestureRecognizer};
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;
use crate::viewer::{DEFAULT_HIT_RADIUS, MemoryViewer};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Could not determine a data directory")]
    NoDataDir,
}

/// Tunables for storage and pointer handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Storage root. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub autosave_interval_secs: u64,
    /// Marker hit radius in page points.
    pub pin_hit_radius: f64,
    pub long_press_ms: u64,
    /// Pointer travel in page points still treated as holding still.
    pub tap_slop: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            pin_hit_radius: DEFAULT_HIT_RADIUS,
            long_press_ms: DEFAULT_LONG_PRESS.as_millis() as u64,
            tap_slop: DEFAULT_TAP_SLOP,
        }
    }
}

impl CaptureConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The storage root to use.
    ///
    /// On Unix: `~/.local/share/roomcapture`
    /// On Windows: `%LOCALAPPDATA%\roomcapture`
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("roomcapture"))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn gesture_recognizer(&self) -> GestureRecognizer {
        GestureRecognizer::new(Duration::from_millis(self.long_press_ms), self.tap_slop)
    }

    /// A headless viewer for a page, using the configured hit radius.
    pub fn viewer(&self, page_size: Size) -> MemoryViewer {
        MemoryViewer::new(page_size).with_hit_radius(self.pin_hit_radius)
    }
}
