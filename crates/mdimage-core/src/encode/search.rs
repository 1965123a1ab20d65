//! Size-constrained re-encoding.
//!
//! The search runs in a fixed order, cheapest fidelity loss first:
//!
//! 1. clamp the longer side to `max_dimension_px` (once);
//! 2. pick the target format from the source format and transparency;
//! 3. for JPEG/WEBP, lower the quality in proportional steps until the
//!    payload fits or the format's floor is reached;
//! 4. transparent PNG/GIF that miss the budget losslessly are demoted to JPEG
//!    and go through step 3;
//! 5. shrink by `fallback_scale` and re-encode at the floor until the payload
//!    fits or the longer side reaches `min_dimension_px` (at least once).
//!
//! Anything still over budget is reported as `SizeLimitExceeded`.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::codec::encode_image;
use super::format::{classify, select_format, FormatPlan};
use super::params::size_kib;
use super::{EncoderError, EncodingParameters, SearchPolicy, TargetFormat};
use crate::decode::{resize_to_fit, scale_by, scaled_dimensions, SourceImage};

/// Overshoot ratio above which quality is cut by half instead of 30%.
const LARGE_OVERSHOOT: f64 = 3.0;

/// Which phase of the search produced an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStage {
    /// First encode after format selection.
    Initial,
    /// Re-encode at a lower quality.
    QualityStep,
    /// First JPEG encode after a lossless format missed the budget.
    FormatDemotion,
    /// Re-encode after shrinking the image.
    DimensionFallback,
}

/// Report passed to the progress hook after every encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeAttempt {
    /// 1-based attempt counter.
    pub index: usize,
    pub stage: AttemptStage,
    pub format: TargetFormat,
    /// `None` for lossless formats.
    pub quality: Option<u8>,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
    pub within_budget: bool,
}

impl EncodeAttempt {
    pub fn size_kib(&self) -> f64 {
        size_kib(self.size_bytes)
    }
}

/// A payload that satisfies the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedResult {
    pub bytes: Vec<u8>,
    pub format: TargetFormat,
    pub width: u32,
    pub height: u32,
    /// Quality the payload was encoded at, `None` for lossless formats.
    pub quality: Option<u8>,
}

impl EncodedResult {
    pub fn mime_subtype(&self) -> &'static str {
        self.format.mime_subtype()
    }

    pub fn size_kib(&self) -> f64 {
        size_kib(self.bytes.len())
    }
}

/// Re-encode `source` to fit `params`, with the default policy and no progress hook.
pub fn encode(
    source: &SourceImage,
    params: &EncodingParameters,
) -> Result<EncodedResult, EncoderError> {
    encode_with_policy(source, params, &SearchPolicy::default(), |_| {})
}

/// Re-encode `source` to fit `params`, calling `on_attempt` after every encode.
pub fn encode_with_progress<F>(
    source: &SourceImage,
    params: &EncodingParameters,
    on_attempt: F,
) -> Result<EncodedResult, EncoderError>
where
    F: FnMut(&EncodeAttempt),
{
    encode_with_policy(source, params, &SearchPolicy::default(), on_attempt)
}

/// Re-encode `source` to fit `params` using an explicit search policy.
///
/// # Errors
///
/// - `UnsupportedFormat` if the declared format is outside the allow-list
/// - `InvalidParameters` if `policy.fallback_scale` is not in `(0, 1)`
/// - `SizeLimitExceeded` if every candidate missed the budget
/// - `EncodingFailed` if a codec rejected the image
pub fn encode_with_policy<F>(
    source: &SourceImage,
    params: &EncodingParameters,
    policy: &SearchPolicy,
    on_attempt: F,
) -> Result<EncodedResult, EncoderError>
where
    F: FnMut(&EncodeAttempt),
{
    let source_format = classify(source.format())?;
    if !(policy.fallback_scale > 0.0 && policy.fallback_scale < 1.0) {
        return Err(EncoderError::InvalidParameters(format!(
            "fallback scale must be between 0 and 1, got {}",
            policy.fallback_scale
        )));
    }
    if source.is_empty() {
        return Err(EncoderError::EncodingFailed {
            format: source_format.name(),
            message: "image has zero size".to_string(),
        });
    }

    let clamped = resize_to_fit(source.image(), params.max_dimension_px(), policy.resample);
    let plan = select_format(source_format, &clamped);

    log::debug!(
        "Encoding {} source {}x{} as {} (clamped to {}x{}, {:?})",
        source_format.name(),
        source.width(),
        source.height(),
        plan.initial().name(),
        clamped.width(),
        clamped.height(),
        plan
    );

    let mut search = Search {
        params,
        policy,
        on_attempt,
        attempts: 0,
    };
    let candidate = search.run(clamped, plan)?;

    if !params.fits(candidate.result.bytes.len()) {
        return Err(EncoderError::SizeLimitExceeded {
            achieved_kib: candidate.result.size_kib(),
            limit_kib: params.max_payload_kib(),
        });
    }

    log::info!(
        "Encoded {}x{} {} at {:.1} KiB after {} attempt(s)",
        candidate.result.width,
        candidate.result.height,
        candidate.result.format.name(),
        candidate.result.size_kib(),
        search.attempts
    );

    Ok(candidate.result)
}

/// Dimensions visited by the shrink-and-retry fallback, in order.
///
/// The first step is always taken. Later steps continue while either side is
/// above `min_dimension_px` and stop early after `max_fallback_steps`.
pub fn fallback_dimensions(width: u32, height: u32, policy: &SearchPolicy) -> Vec<(u32, u32)> {
    let mut steps = Vec::new();
    let (mut w, mut h) = (width, height);
    while can_shrink(w, h, steps.len(), policy) {
        let next = scaled_dimensions(w, h, policy.fallback_scale);
        if next == (w, h) {
            break;
        }
        steps.push(next);
        (w, h) = next;
    }
    steps
}

/// Next quality after an over-budget encode.
///
/// Cuts 50% when the payload is more than three times the budget, else 30%,
/// always by at least one step, never below `floor`.
pub fn next_quality(quality: u8, overshoot: f64, floor: u8) -> u8 {
    let cut = if overshoot > LARGE_OVERSHOOT { 0.5 } else { 0.3 };
    let reduction = ((f64::from(quality) * cut) as u8).max(1);
    quality.saturating_sub(reduction).max(floor)
}

fn can_shrink(width: u32, height: u32, steps_taken: usize, policy: &SearchPolicy) -> bool {
    if steps_taken == 0 {
        return true;
    }
    let under_step_limit = policy
        .max_fallback_steps
        .is_none_or(|max| steps_taken < max as usize);
    under_step_limit && width.max(height) > policy.min_dimension_px
}

struct Candidate {
    image: DynamicImage,
    result: EncodedResult,
}

struct Search<'a, F> {
    params: &'a EncodingParameters,
    policy: &'a SearchPolicy,
    on_attempt: F,
    attempts: usize,
}

impl<F> Search<'_, F>
where
    F: FnMut(&EncodeAttempt),
{
    fn run(&mut self, image: DynamicImage, plan: FormatPlan) -> Result<Candidate, EncoderError> {
        let candidate = match plan {
            FormatPlan::Direct(format) => {
                self.quality_search(image, format, AttemptStage::Initial)?
            }
            FormatPlan::LosslessThenJpeg(lossless) => {
                let candidate = self.attempt(image, lossless, None, AttemptStage::Initial)?;
                if self.fits(&candidate) {
                    return Ok(candidate);
                }
                log::debug!(
                    "{} payload {:.1} KiB over budget, demoting to JPEG",
                    lossless.name(),
                    candidate.result.size_kib()
                );
                let opaque = DynamicImage::ImageRgb8(candidate.image.to_rgb8());
                self.quality_search(opaque, TargetFormat::Jpeg, AttemptStage::FormatDemotion)?
            }
        };

        self.dimension_fallback(candidate)
    }

    /// Encode at `base_quality`, then step quality down towards the floor.
    fn quality_search(
        &mut self,
        image: DynamicImage,
        format: TargetFormat,
        first_stage: AttemptStage,
    ) -> Result<Candidate, EncoderError> {
        let Some(floor) = format.quality_floor() else {
            return self.attempt(image, format, None, first_stage);
        };

        let mut quality = self.params.base_quality();
        let mut candidate = self.attempt(image, format, Some(quality), first_stage)?;

        while !self.fits(&candidate) && quality > floor {
            let overshoot = candidate.result.size_kib() / self.params.max_payload_kib();
            quality = next_quality(quality, overshoot, floor);
            candidate = self.attempt(candidate.image, format, Some(quality), AttemptStage::QualityStep)?;
        }

        Ok(candidate)
    }

    /// Shrink and re-encode at the floor until the payload fits or the
    /// image reaches the minimum size.
    fn dimension_fallback(&mut self, mut candidate: Candidate) -> Result<Candidate, EncoderError> {
        let format = candidate.result.format;
        let quality = format
            .quality_floor()
            .map(|floor| floor.min(self.params.base_quality()));
        let mut steps = 0;

        while !self.fits(&candidate)
            && can_shrink(candidate.result.width, candidate.result.height, steps, self.policy)
        {
            let shrunk = scale_by(&candidate.image, self.policy.fallback_scale, self.policy.resample);
            if (shrunk.width(), shrunk.height()) == (candidate.result.width, candidate.result.height) {
                break;
            }
            steps += 1;
            candidate = self.attempt(shrunk, format, quality, AttemptStage::DimensionFallback)?;
        }

        Ok(candidate)
    }

    fn attempt(
        &mut self,
        image: DynamicImage,
        format: TargetFormat,
        quality: Option<u8>,
        stage: AttemptStage,
    ) -> Result<Candidate, EncoderError> {
        let bytes = encode_image(&image, format, quality.unwrap_or(self.params.base_quality()))?;
        self.attempts += 1;

        let report = EncodeAttempt {
            index: self.attempts,
            stage,
            format,
            quality,
            width: image.width(),
            height: image.height(),
            size_bytes: bytes.len(),
            within_budget: self.params.fits(bytes.len()),
        };
        log::debug!(
            "Attempt {} ({:?}): {} {}x{} q={:?} -> {:.1} KiB",
            report.index,
            report.stage,
            format.name(),
            report.width,
            report.height,
            quality,
            report.size_kib()
        );
        (self.on_attempt)(&report);

        Ok(Candidate {
            result: EncodedResult {
                bytes,
                format,
                width: report.width,
                height: report.height,
                quality,
            },
            image,
        })
    }

    fn fits(&self, candidate: &Candidate) -> bool {
        self.params.fits(candidate.result.bytes.len())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use proptest::prelude::*;

    proptest! {
        /// Property: quality steps strictly decrease and never pass the floor.
        #[test]
        fn prop_next_quality_decreases(
            quality in 2u8..=100,
            overshoot in 1.0f64..50.0,
            floor in 1u8..=20,
        ) {
            prop_assume!(quality > floor);
            let next = next_quality(quality, overshoot, floor);
            prop_assert!(next < quality);
            prop_assert!(next >= floor);
        }

        /// Property: the fallback schedule shrinks monotonically.
        #[test]
        fn prop_fallback_schedule_shrinks(width in 1u32..=3000, height in 1u32..=3000) {
            let policy = SearchPolicy::default();
            let steps = fallback_dimensions(width, height, &policy);
            let mut previous = (width, height);
            for &(w, h) in &steps {
                prop_assert!(w <= previous.0 && h <= previous.1);
                prop_assert!(w < previous.0 || h < previous.1);
                previous = (w, h);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Property: a successful encode never exceeds the budget or the dimension limit.
        #[test]
        fn prop_success_respects_budget(
            width in 1u32..=96,
            height in 1u32..=96,
            max_kib in 0.5f64..8.0,
            max_dim in 16u32..=96,
            quality in 1u8..=100,
            seed in any::<u8>(),
        ) {
            let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
                Rgb([
                    (x as u8).wrapping_mul(seed),
                    (y as u8).wrapping_mul(seed ^ 0x5A),
                    ((x * y) as u8).wrapping_add(seed),
                ])
            }));
            let source = SourceImage::new(img, Some(ImageFormat::Jpeg));
            let params = EncodingParameters::new(max_kib, max_dim, quality).unwrap();

            match encode(&source, &params) {
                Ok(result) => {
                    prop_assert!(result.size_kib() <= max_kib);
                    prop_assert!(result.width.max(result.height) <= max_dim);
                }
                Err(EncoderError::SizeLimitExceeded { achieved_kib, .. }) => {
                    prop_assert!(achieved_kib > max_kib);
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
    }
}
