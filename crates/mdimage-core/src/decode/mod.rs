//! Image decoding for dropped files.
//!
//! This module provides functionality for:
//! - Detecting the container format and checking it against the allow-list
//!   (PNG, JPEG, GIF, BMP, WEBP)
//! - Decoding to a [`SourceImage`] with EXIF orientation applied
//! - Resizing helpers used by the dimension clamp and fallback steps
//!
//! All operations are synchronous and single-threaded.
//!
//! # Examples
//!
//! ```ignore
//! use mdimage_core::decode::open;
//!
//! let image = open("screenshot.png")?;
//! println!("Decoded {}x{} image", image.width(), image.height());
//! ```

mod load;
mod resize;
mod types;

pub use load::{decode_bytes, detect_format, open};
pub use resize::{
    calculate_fit_dimensions, resize, resize_to_fit, scale_by, scaled_dimensions,
};
pub use types::{
    format_name, DecodeError, FilterType, Orientation, SourceFormat, SourceImage,
    SUPPORTED_FORMATS,
};

pub(crate) use types::uses_transparency;
