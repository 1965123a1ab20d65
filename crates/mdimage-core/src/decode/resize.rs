//! Image resizing for the dimension clamp and the shrink-and-retry fallback.
//!
//! All functions return new `DynamicImage` instances without modifying the input.

use image::{DynamicImage, GenericImageView};

use super::FilterType;

/// Resize an image to exact dimensions.
///
/// Zero target dimensions are raised to 1. If the dimensions already match,
/// the image is cloned.
pub fn resize(image: &DynamicImage, width: u32, height: u32, filter: FilterType) -> DynamicImage {
    let (width, height) = (width.max(1), height.max(1));

    if image.dimensions() == (width, height) {
        return image.clone();
    }

    image.resize_exact(width, height, filter.to_image_filter())
}

/// Resize an image so its longest edge is at most `max_edge`, preserving aspect ratio.
///
/// Images that already fit are returned unchanged (cloned).
pub fn resize_to_fit(image: &DynamicImage, max_edge: u32, filter: FilterType) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = calculate_fit_dimensions(width, height, max_edge);
    resize(image, new_width, new_height, filter)
}

/// Uniformly scale an image by `factor` (expected in `(0, 1)`).
pub fn scale_by(image: &DynamicImage, factor: f64, filter: FilterType) -> DynamicImage {
    let (width, height) = scaled_dimensions(image.width(), image.height(), factor);
    resize(image, width, height, filter)
}

/// Calculate dimensions to fit within `max_edge` while preserving aspect ratio.
///
/// The longer side becomes exactly `max_edge`; the shorter side is scaled by
/// the same ratio and floored, never below 1. Dimensions that already fit are
/// returned as-is.
pub fn calculate_fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let max_edge = max_edge.max(1);
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }

    let longest = u64::from(width.max(height));
    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(max_edge) / longest;
        (scaled as u32).max(1)
    };

    (scale(width), scale(height))
}

/// Dimensions after multiplying both sides by `factor`, truncated, never below 1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |side: u32| -> u32 { ((f64::from(side) * factor) as u32).max(1) };
    (scale(width), scale(height))
}
