//! Size-constrained image encoding.
//!
//! This module provides functionality for:
//! - Encoding images as JPEG, PNG, GIF, BMP or WEBP
//! - Choosing an output format from the source format and its transparency
//! - Searching quality, format and dimensions until the payload fits a
//!   byte budget
//!
//! # Architecture
//!
//! Every call is synchronous and runs to completion on the calling thread.
//! Hosts that want to repaint between encode passes pass a progress hook to
//! [`encode_with_progress`]; it is invoked after each attempt.
//!
//! # Examples
//!
//! ```ignore
//! use mdimage_core::encode::{encode, EncodingParameters};
//!
//! let params = EncodingParameters::new(30.0, 768, 95)?;
//! let result = encode(&source, &params)?;
//! println!("{} bytes of image/{}", result.bytes.len(), result.mime_subtype());
//! ```

mod codec;
mod error;
mod format;
mod params;
mod search;

pub use codec::encode_image;
pub use error::EncoderError;
pub use format::{
    classify, select_format, FormatPlan, TargetFormat, JPEG_QUALITY_FLOOR, WEBP_QUALITY_FLOOR,
};
pub use params::{size_kib, EncodingParameters, SearchPolicy, BYTES_PER_KIB};
pub use search::{
    encode, encode_with_policy, encode_with_progress, fallback_dimensions, next_quality,
    AttemptStage, EncodeAttempt, EncodedResult,
};
