//! Persisted user settings.
//!
//! Settings live in a flat JSON record:
//!
//! ```json
//! { "max_size_kb": 30, "max_image_size": 768, "image_quality": 95 }
//! ```
//!
//! Loading never fails. A missing or unreadable file, malformed JSON, or
//! out-of-range values fall back to the defaults (per key for ranges).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::{EncoderError, EncodingParameters};

pub const DEFAULT_MAX_SIZE_KB: f64 = 30.0;
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 768;
pub const DEFAULT_IMAGE_QUALITY: u8 = 95;

const APP_DIR: &str = "mdimage";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings path unavailable")]
    MissingSettingsPath,
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Payload budget in KiB.
    pub max_size_kb: f64,
    /// Longest side after the dimension clamp.
    pub max_image_size: u32,
    /// Starting quality for lossy formats.
    pub image_quality: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_size_kb: DEFAULT_MAX_SIZE_KB,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            image_quality: DEFAULT_IMAGE_QUALITY,
        }
    }
}

impl Settings {
    /// Load from the default location.
    pub fn load() -> Self {
        match default_settings_path() {
            Ok(path) => Self::load_from(path),
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Load from `path`, falling back to defaults on any problem.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::read(path) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!(
                    "Failed to load settings from {}: {e}; using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = default_settings_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    /// Convert to per-call encoding parameters.
    pub fn to_params(&self) -> std::result::Result<EncodingParameters, EncoderError> {
        EncodingParameters::new(self.max_size_kb, self.max_image_size, self.image_quality)
    }

    /// Replace any out-of-range value with its default.
    pub fn sanitized(mut self) -> Self {
        if !self.max_size_kb.is_finite() || self.max_size_kb <= 0.0 {
            log::warn!("Ignoring max_size_kb = {}", self.max_size_kb);
            self.max_size_kb = DEFAULT_MAX_SIZE_KB;
        }
        if self.max_image_size == 0 {
            log::warn!("Ignoring max_image_size = 0");
            self.max_image_size = DEFAULT_MAX_IMAGE_SIZE;
        }
        if !(1..=100).contains(&self.image_quality) {
            log::warn!("Ignoring image_quality = {}", self.image_quality);
            self.image_quality = DEFAULT_IMAGE_QUALITY;
        }
        self
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// `<config dir>/mdimage/settings.json`
pub fn default_settings_path() -> Result<PathBuf> {
    let base = directories::BaseDirs::new().ok_or(SettingsError::MissingSettingsPath)?;
    let mut path = base.config_dir().to_path_buf();
    path.push(APP_DIR);
    path.push(SETTINGS_FILE);
    Ok(path)
}
