// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling

use crate::constants::{paths, timing};
use crate::device::ImageEncoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Bound on a single camera acquisition attempt, in seconds
    pub acquire_timeout_secs: u64,
    /// Number of start() attempts before the step becomes terminal
    pub max_start_attempts: u32,
    /// Still-image encoding to request from the camera
    pub encoding: ImageEncoding,
    /// Directory for submitted photos (None = platform pictures dir)
    pub output_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_secs: timing::ACQUIRE_TIMEOUT.as_secs(),
            max_start_attempts: timing::MAX_START_ATTEMPTS,
            encoding: ImageEncoding::default(), // JPEG
            output_dir: None,                   // platform pictures dir
        }
    }
}

impl CaptureConfig {
    /// Acquisition timeout as a Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Resolve the directory submitted photos are written to
    pub fn output_directory(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(paths::APP_DIR_NAME)
    }

    /// Path of the config file under the platform config directory
    pub fn config_path() -> Option<PathBuf> {
        Some(
            dirs::config_dir()?
                .join(paths::APP_DIR_NAME)
                .join(paths::CONFIG_FILE_NAME),
        )
    }

    /// Load the config from disk, falling back to defaults
    ///
    /// A missing file is normal on first run; a malformed file is logged and
    /// replaced by defaults rather than aborting the step.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the config to the platform config directory
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::other("No config directory available"));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(&path, contents)?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }
}
