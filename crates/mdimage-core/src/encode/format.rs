//! Output format table and the source → target format policy.

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use super::EncoderError;
use crate::decode::{format_name, uses_transparency, SourceFormat};

/// Quality floor for JPEG output.
pub const JPEG_QUALITY_FLOOR: u8 = 5;
/// Quality floor for WEBP output.
pub const WEBP_QUALITY_FLOOR: u8 = 20;

/// An encoding the payload can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
}

impl TargetFormat {
    /// Token used in `data:image/<subtype>` URIs.
    pub fn mime_subtype(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Gif => "gif",
            TargetFormat::Bmp => "bmp",
            TargetFormat::Webp => "webp",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
            TargetFormat::Gif => "GIF",
            TargetFormat::Bmp => "BMP",
            TargetFormat::Webp => "WEBP",
        }
    }

    /// Lowest quality the search may reach, or `None` for lossless formats.
    pub fn quality_floor(self) -> Option<u8> {
        match self {
            TargetFormat::Jpeg => Some(JPEG_QUALITY_FLOOR),
            TargetFormat::Webp => Some(WEBP_QUALITY_FLOOR),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TargetFormat::Jpeg => ImageFormat::Jpeg,
            TargetFormat::Png => ImageFormat::Png,
            TargetFormat::Gif => ImageFormat::Gif,
            TargetFormat::Bmp => ImageFormat::Bmp,
            TargetFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl From<SourceFormat> for TargetFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Png => TargetFormat::Png,
            SourceFormat::Jpeg => TargetFormat::Jpeg,
            SourceFormat::Gif => TargetFormat::Gif,
            SourceFormat::Bmp => TargetFormat::Bmp,
            SourceFormat::Webp => TargetFormat::Webp,
        }
    }
}

/// How the search should treat the selected format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatPlan {
    /// Encode in this format throughout.
    Direct(TargetFormat),
    /// Try the lossless format first, then demote to JPEG with alpha discarded.
    LosslessThenJpeg(TargetFormat),
}

impl FormatPlan {
    /// The format of the first encode attempt.
    pub fn initial(self) -> TargetFormat {
        match self {
            FormatPlan::Direct(format) | FormatPlan::LosslessThenJpeg(format) => format,
        }
    }
}

/// Classify a declared format against the allow-list.
///
/// A missing declaration is treated as PNG.
pub fn classify(format: Option<ImageFormat>) -> Result<SourceFormat, EncoderError> {
    match format {
        None => Ok(SourceFormat::Png),
        Some(format) => SourceFormat::from_image_format(format)
            .ok_or_else(|| EncoderError::unsupported(format_name(format))),
    }
}

/// Choose the output plan for a source format and its (clamped) pixels.
///
/// PNG and GIF without transparency are re-encoded as JPEG straight away;
/// with transparency they stay lossless and are only demoted to JPEG if the
/// lossless payload misses the budget.
pub fn select_format(source: SourceFormat, image: &DynamicImage) -> FormatPlan {
    match source {
        SourceFormat::Png | SourceFormat::Gif => {
            if uses_transparency(image) {
                FormatPlan::LosslessThenJpeg(source.into())
            } else {
                FormatPlan::Direct(TargetFormat::Jpeg)
            }
        }
        other => FormatPlan::Direct(other.into()),
    }
}
