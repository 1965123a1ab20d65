//! mdimage Core - size-constrained image payloads for Markdown
//!
//! This crate turns a dropped image into a base64 `data:` URI wrapped in a
//! Markdown image reference, re-encoding it until the payload fits a
//! configurable byte budget.
//!
//! # Module Structure
//!
//! - `decode` - Format detection, decoding, EXIF orientation, resizing
//! - `encode` - Per-format codecs and the size-constrained search
//! - `markdown` - base64, data URI and Markdown rendering
//! - `settings` - Persisted user settings

use std::path::Path;

pub mod decode;
pub mod encode;
pub mod markdown;
pub mod settings;

pub use decode::{DecodeError, SourceImage};
pub use encode::{
    encode, encode_with_progress, EncodeAttempt, EncodedResult, EncoderError,
    EncodingParameters, SearchPolicy, TargetFormat,
};
pub use markdown::DEFAULT_TAG;
pub use settings::Settings;

/// A converted image ready to paste.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownImage {
    /// Base64 of `result.bytes`.
    pub base64: String,
    /// `![tag](data:image/<subtype>;base64,...)`
    pub markdown: String,
    pub result: EncodedResult,
}

/// Open, re-encode and render an image file.
pub fn convert_file<F>(
    path: impl AsRef<Path>,
    params: &EncodingParameters,
    tag: &str,
    on_attempt: F,
) -> Result<MarkdownImage, EncoderError>
where
    F: FnMut(&EncodeAttempt),
{
    let source = decode::open(path)?;
    convert_image(&source, params, tag, on_attempt)
}

/// Decode, re-encode and render an in-memory encoded image.
pub fn convert_bytes<F>(
    bytes: &[u8],
    params: &EncodingParameters,
    tag: &str,
    on_attempt: F,
) -> Result<MarkdownImage, EncoderError>
where
    F: FnMut(&EncodeAttempt),
{
    let source = decode::decode_bytes(bytes)?;
    convert_image(&source, params, tag, on_attempt)
}

/// Re-encode and render an already decoded image.
pub fn convert_image<F>(
    source: &SourceImage,
    params: &EncodingParameters,
    tag: &str,
    on_attempt: F,
) -> Result<MarkdownImage, EncoderError>
where
    F: FnMut(&EncodeAttempt),
{
    let result = encode_with_progress(source, params, on_attempt)?;
    let base64 = markdown::to_base64(&result);
    let markdown = markdown::markdown_image(tag, result.mime_subtype(), &base64);

    Ok(MarkdownImage {
        base64,
        markdown,
        result,
    })
}
