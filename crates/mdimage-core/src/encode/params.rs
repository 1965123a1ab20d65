//! Encoding parameters and search policy.

use serde::{Deserialize, Serialize};

use super::EncoderError;
use crate::decode::FilterType;

/// Bytes per KiB, used for all payload size comparisons.
pub const BYTES_PER_KIB: f64 = 1024.0;

/// User-facing parameters for one encode call.
///
/// Immutable once built; each call to the encoder receives its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncodingParameters {
    max_payload_kib: f64,
    max_dimension_px: u32,
    base_quality: u8,
}

impl EncodingParameters {
    /// Validate and build parameters.
    ///
    /// # Errors
    ///
    /// Returns `EncoderError::InvalidParameters` if the payload budget is not a
    /// positive finite number, the dimension limit is zero, or the quality is
    /// outside 1..=100.
    pub fn new(
        max_payload_kib: f64,
        max_dimension_px: u32,
        base_quality: u8,
    ) -> Result<Self, EncoderError> {
        if !max_payload_kib.is_finite() || max_payload_kib <= 0.0 {
            return Err(EncoderError::InvalidParameters(format!(
                "max payload must be a positive number of KiB, got {max_payload_kib}"
            )));
        }
        if max_dimension_px == 0 {
            return Err(EncoderError::InvalidParameters(
                "max dimension must be at least 1 pixel".to_string(),
            ));
        }
        if !(1..=100).contains(&base_quality) {
            return Err(EncoderError::InvalidParameters(format!(
                "quality must be between 1 and 100, got {base_quality}"
            )));
        }

        Ok(Self {
            max_payload_kib,
            max_dimension_px,
            base_quality,
        })
    }

    pub fn max_payload_kib(&self) -> f64 {
        self.max_payload_kib
    }

    pub fn max_dimension_px(&self) -> u32 {
        self.max_dimension_px
    }

    pub fn base_quality(&self) -> u8 {
        self.base_quality
    }

    /// Whether a payload of `len` bytes fits the budget.
    pub fn fits(&self, len: usize) -> bool {
        size_kib(len) <= self.max_payload_kib
    }
}

impl Default for EncodingParameters {
    fn default() -> Self {
        Self {
            max_payload_kib: 30.0,
            max_dimension_px: 768,
            base_quality: 95,
        }
    }
}

/// Tuning knobs for the search itself, kept apart from the user parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchPolicy {
    /// Filter for the dimension clamp and every fallback step.
    pub resample: FilterType,
    /// Factor applied to both sides on each fallback step.
    pub fallback_scale: f64,
    /// Fallback continues while either side is above this. The first step is
    /// always taken.
    pub min_dimension_px: u32,
    /// Upper bound on fallback steps (at least one is taken); `None` shrinks
    /// until the minimum.
    pub max_fallback_steps: Option<u32>,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            resample: FilterType::Lanczos3,
            fallback_scale: 0.9,
            min_dimension_px: 50,
            max_fallback_steps: None,
        }
    }
}

/// Size of `len` bytes in KiB.
pub fn size_kib(len: usize) -> f64 {
    len as f64 / BYTES_PER_KIB
}
