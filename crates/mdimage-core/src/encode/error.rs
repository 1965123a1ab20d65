use thiserror::Error;

use crate::decode::{DecodeError, SUPPORTED_FORMATS};

/// Errors that can occur while producing a size-constrained payload.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Source format is outside PNG, JPEG, GIF, BMP and WEBP.
    #[error("Unsupported image format: {format}. Please use one of {supported}")]
    UnsupportedFormat {
        format: String,
        supported: &'static str,
    },

    /// No candidate encoding met the payload budget.
    #[error("Encoded image is {achieved_kib:.1} KiB, exceeding the {limit_kib:.1} KiB limit")]
    SizeLimitExceeded { achieved_kib: f64, limit_kib: f64 },

    /// The source could not be opened or decoded.
    #[error("Failed to decode image: {0}")]
    DecodeFailure(DecodeError),

    /// Parameters outside their documented ranges.
    #[error("Invalid encoding parameters: {0}")]
    InvalidParameters(String),

    /// The underlying codec rejected the image.
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: &'static str,
        message: String,
    },
}

impl EncoderError {
    pub(crate) fn unsupported(format: impl Into<String>) -> Self {
        EncoderError::UnsupportedFormat {
            format: format.into(),
            supported: SUPPORTED_FORMATS,
        }
    }
}

impl From<DecodeError> for EncoderError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat { format } => EncoderError::unsupported(format),
            other => EncoderError::DecodeFailure(other),
        }
    }
}
