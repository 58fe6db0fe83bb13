//! Persisted application settings
//!
//! A flat JSON file mirroring what the UI controls expose: selected voice,
//! one or two output devices, volume and window flags. Loading is tolerant:
//! a missing or malformed file falls back to defaults, and out-of-range
//! indices are ignored at the point of use rather than treated as fatal.

use crate::{Result, VoxError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Upper bound of the volume control (percent)
pub const MAX_VOLUME_PERCENT: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Index into the fixed voice catalog
    pub voice_index: usize,

    /// Primary output device index
    pub output1_index: usize,

    /// Optional secondary output device index
    pub output2_index: Option<usize>,

    /// Volume control position, 0-200 (100 = unity gain)
    pub volume_percent: u32,

    /// UI theme flag, persisted on behalf of the external UI
    pub dark_mode: bool,

    /// Window stay-on-top flag, persisted on behalf of the external UI
    pub stay_on_top: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            voice_index: 0,
            output1_index: 0,
            output2_index: None,
            volume_percent: 100,
            dark_mode: false,
            stay_on_top: false,
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file, falling back to defaults on any problem.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
                Ok(mut settings) => {
                    settings.volume_percent = settings.volume_percent.min(MAX_VOLUME_PERCENT);
                    debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Save settings as JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VoxError::Persistence(format!("Failed to encode settings: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|e| VoxError::Persistence(format!("Failed to write settings: {}", e)))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            VoxError::Persistence(format!("Failed to replace settings file: {}", e))
        })?;

        Ok(())
    }

    /// Linear gain multiplier derived from the volume control (0.0-2.0)
    pub fn gain(&self) -> f32 {
        self.volume_percent.min(MAX_VOLUME_PERCENT) as f32 / 100.0
    }

    /// Set the volume control position, clamped to the 0-200 range
    pub fn set_volume_percent(&mut self, percent: u32) {
        self.volume_percent = percent.min(MAX_VOLUME_PERCENT);
    }
}
