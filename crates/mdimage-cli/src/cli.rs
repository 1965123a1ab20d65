//! Command-line arguments and how they combine with persisted settings.

use std::path::PathBuf;

use clap::Parser;
use mdimage_core::settings::{self, Settings};
use mdimage_core::DEFAULT_TAG;

/// Convert images into base64 Markdown image references that fit a size budget.
///
/// Each file is processed on its own; the resulting Markdown is printed and
/// copied to the clipboard.
#[derive(Parser, Debug)]
#[command(name = "mdimage")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Image files to convert (PNG, JPEG, GIF, BMP or WEBP)
    #[arg(value_name = "IMAGE", required_unless_present = "save_settings")]
    pub inputs: Vec<PathBuf>,

    /// Maximum payload size in KiB
    #[arg(short = 's', long, value_name = "KIB")]
    pub max_size_kb: Option<f64>,

    /// Maximum length of the longer side in pixels
    #[arg(short = 'd', long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_image_size: Option<u32>,

    /// Starting quality for JPEG and WEBP (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Alt text of the Markdown image
    #[arg(short, long, default_value = DEFAULT_TAG)]
    pub tag: String,

    /// Settings file (defaults to the per-user config directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Persist the effective settings before converting
    #[arg(long)]
    pub save_settings: bool,

    /// Print only; leave the clipboard untouched
    #[arg(long)]
    pub no_clipboard: bool,

    /// Show every encode attempt
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Settings file in use, if one can be located.
    pub fn settings_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => settings::default_settings_path().ok(),
        }
    }

    /// Persisted settings with command-line overrides applied.
    pub fn resolve_settings(&self) -> Settings {
        let mut settings = match self.settings_path() {
            Some(path) => Settings::load_from(path),
            None => Settings::default(),
        };

        if let Some(max_size_kb) = self.max_size_kb {
            settings.max_size_kb = max_size_kb;
        }
        if let Some(max_image_size) = self.max_image_size {
            settings.max_image_size = max_image_size;
        }
        if let Some(quality) = self.quality {
            settings.image_quality = quality;
        }
        settings
    }
}
