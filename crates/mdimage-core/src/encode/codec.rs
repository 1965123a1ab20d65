//! Per-format encoders.
//!
//! JPEG, PNG, GIF and BMP go through the `image` crate's encoders; lossy WEBP
//! goes through libwebp via the `webp` crate, since `image` only writes
//! lossless WEBP. Lossless formats ignore the quality argument and are
//! written with their strongest compression settings.

use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use super::{EncoderError, TargetFormat};

/// NeuQuant sampling factor for GIF palettes (1 = best, 30 = fastest).
const GIF_QUANTIZER_SPEED: i32 = 1;

/// Encode `image` as `format`.
///
/// `quality` (clamped to 1-100) applies to JPEG and WEBP only. JPEG output
/// drops any alpha channel; PNG, GIF, BMP and WEBP keep it when present.
pub fn encode_image(
    image: &DynamicImage,
    format: TargetFormat,
    quality: u8,
) -> Result<Vec<u8>, EncoderError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(EncoderError::EncodingFailed {
            format: format.name(),
            message: format!("image has zero size ({width}x{height})"),
        });
    }

    let quality = quality.clamp(1, 100);
    let failed = |e: image::ImageError| EncoderError::EncodingFailed {
        format: format.name(),
        message: e.to_string(),
    };

    let mut bytes = Vec::new();
    match format {
        TargetFormat::Jpeg => {
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(failed)?;
        }
        TargetFormat::Png => {
            let (raw, color) = raw_pixels(image);
            PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, PngFilterType::Adaptive)
                .write_image(&raw, width, height, color)
                .map_err(failed)?;
        }
        TargetFormat::Gif => {
            let rgba = image.to_rgba8();
            // The trailer is written when the encoder is dropped.
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, GIF_QUANTIZER_SPEED);
            encoder
                .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(failed)?;
            drop(encoder);
        }
        TargetFormat::Bmp => {
            let (raw, color) = raw_pixels(image);
            BmpEncoder::new(&mut bytes)
                .write_image(&raw, width, height, color)
                .map_err(failed)?;
        }
        TargetFormat::Webp => {
            bytes = encode_webp(image, quality)?;
        }
    }

    Ok(bytes)
}

/// 8-bit pixels in RGB or RGBA layout depending on the source color mode.
fn raw_pixels(image: &DynamicImage) -> (Vec<u8>, ExtendedColorType) {
    if image.color().has_alpha() {
        (image.to_rgba8().into_raw(), ExtendedColorType::Rgba8)
    } else {
        (image.to_rgb8().into_raw(), ExtendedColorType::Rgb8)
    }
}

fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncoderError> {
    let (width, height) = (image.width(), image.height());
    let (raw, color) = raw_pixels(image);

    let encoder = match color {
        ExtendedColorType::Rgba8 => webp::Encoder::from_rgba(&raw, width, height),
        _ => webp::Encoder::from_rgb(&raw, width, height),
    };

    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| EncoderError::EncodingFailed {
            format: TargetFormat::Webp.name(),
            message: format!("{e:?}"),
        })?;

    Ok(memory.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 127 / (width + height)) as u8,
            ])
        }))
    }

    fn translucent(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
            Rgba([200, 100, 50, (x * 255 / width) as u8])
        }))
    }

    #[test]
    fn test_encode_jpeg_markers() {
        let jpeg = encode_image(&gradient(100, 100), TargetFormat::Jpeg, 90).unwrap();

        // SOI and EOI markers
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let img = gradient(100, 100);
        let low_q = encode_image(&img, TargetFormat::Jpeg, 20).unwrap();
        let high_q = encode_image(&img, TargetFormat::Jpeg, 95).unwrap();
        assert!(high_q.len() > low_q.len());
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let img = gradient(10, 10);
        assert!(encode_image(&img, TargetFormat::Jpeg, 0).is_ok());
        assert!(encode_image(&img, TargetFormat::Jpeg, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_discards_alpha() {
        let jpeg = encode_image(&translucent(16, 16), TargetFormat::Jpeg, 80).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_encode_png_keeps_alpha() {
        let png = encode_image(&translucent(16, 16), TargetFormat::Png, 95).unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (16, 16));
    }

    #[test]
    fn test_encode_png_ignores_quality() {
        let img = gradient(32, 32);
        let a = encode_image(&img, TargetFormat::Png, 10).unwrap();
        let b = encode_image(&img, TargetFormat::Png, 100).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_gif_has_trailer() {
        let gif = encode_image(&translucent(20, 10), TargetFormat::Gif, 95).unwrap();
        assert_eq!(&gif[0..6], b"GIF89a");
        assert_eq!(gif.last(), Some(&0x3B));

        let decoded = image::load_from_memory(&gif).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn test_encode_bmp() {
        let bmp = encode_image(&gradient(10, 10), TargetFormat::Bmp, 95).unwrap();
        assert_eq!(&bmp[0..2], b"BM");
        assert_eq!(image::guess_format(&bmp).unwrap(), image::ImageFormat::Bmp);
    }

    #[test]
    fn test_encode_webp_lossy() {
        let img = gradient(64, 64);
        let low = encode_image(&img, TargetFormat::Webp, 20).unwrap();
        let high = encode_image(&img, TargetFormat::Webp, 95).unwrap();

        assert_eq!(&low[0..4], b"RIFF");
        assert_eq!(&low[8..12], b"WEBP");
        assert!(high.len() >= low.len());
    }

    #[test]
    fn test_encode_zero_size_fails() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            encode_image(&empty, TargetFormat::Png, 95),
            Err(EncoderError::EncodingFailed { .. })
        ));
    }

    #[test]
    fn test_encode_deterministic() {
        let img = gradient(24, 24);
        for format in [TargetFormat::Jpeg, TargetFormat::Png, TargetFormat::Bmp] {
            let a = encode_image(&img, format, 70).unwrap();
            let b = encode_image(&img, format, 70).unwrap();
            assert_eq!(a, b, "{format:?} output should be deterministic");
        }
    }
}
