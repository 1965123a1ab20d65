//! Decoding of dropped files with format detection and EXIF orientation handling.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::{ImageFormat, ImageReader};

use super::types::format_name;
use super::{DecodeError, Orientation, SourceFormat, SourceImage};

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes carry no known image signature.
/// Returns `DecodeError::UnsupportedFormat` if the format is outside the allow-list.
/// Returns `DecodeError::CorruptedFile` if decoding fails.
pub fn decode_bytes(bytes: &[u8]) -> Result<SourceImage, DecodeError> {
    let format = detect_format(bytes)?;

    let img = ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let orientation = extract_orientation(bytes);
    if orientation != Orientation::Normal {
        log::debug!("Applying EXIF orientation {orientation:?}");
    }
    let oriented = orientation.apply(img);
    Ok(SourceImage::new(oriented, Some(format)))
}

/// Read and decode an image file.
pub fn open(path: impl AsRef<Path>) -> Result<SourceImage, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    log::debug!("Read {} ({} bytes)", path.display(), bytes.len());
    decode_bytes(&bytes)
}

/// Identify the container format from its magic bytes and check it
/// against the allow-list.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::InvalidFormat)?;
    if SourceFormat::from_image_format(format).is_none() {
        return Err(DecodeError::UnsupportedFormat {
            format: format_name(format),
        });
    }
    Ok(format)
}

/// Extract EXIF orientation from encoded bytes.
///
/// Returns `Orientation::Normal` if no EXIF data is found or orientation
/// cannot be determined.
fn extract_orientation(bytes: &[u8]) -> Orientation {
    let exif_reader = Reader::new();
    let mut cursor = Cursor::new(bytes);

    match exif_reader.read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};

    fn encode_as(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 8, Rgba([200, 40, 40, 255])));
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let bytes = encode_as(ImageFormat::Png);
        let source = decode_bytes(&bytes).unwrap();
        assert_eq!(source.dimensions(), (12, 8));
        assert_eq!(source.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn test_decode_jpeg_without_exif() {
        let bytes = encode_as(ImageFormat::Jpeg);
        let source = decode_bytes(&bytes).unwrap();
        assert_eq!(source.image().dimensions(), (12, 8));
        assert_eq!(source.format(), Some(ImageFormat::Jpeg));
        assert_eq!(extract_orientation(&bytes), Orientation::Normal);
    }

    /// Splice an APP1 Exif segment holding a single Orientation tag after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"MM\0\x2A");
        tiff.extend_from_slice(&8u32.to_be_bytes());
        tiff.extend_from_slice(&1u16.to_be_bytes());
        tiff.extend_from_slice(&0x0112u16.to_be_bytes());
        tiff.extend_from_slice(&3u16.to_be_bytes());
        tiff.extend_from_slice(&1u32.to_be_bytes());
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_be_bytes());

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_decode_jpeg_applies_exif_rotation() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 10, Rgb([10, 120, 200])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        let bytes = with_exif_orientation(&buffer.into_inner(), 6);

        assert_eq!(extract_orientation(&bytes), Orientation::Rotate90CW);

        let source = decode_bytes(&bytes).unwrap();
        assert_eq!(source.dimensions(), (10, 40));
        assert_eq!(source.format(), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_decode_gif_and_bmp() {
        for format in [ImageFormat::Gif, ImageFormat::Bmp] {
            let bytes = encode_as(format);
            let source = decode_bytes(&bytes).unwrap();
            assert_eq!(source.format(), Some(format));
            assert_eq!(source.dimensions(), (12, 8));
        }
    }

    #[test]
    fn test_decode_garbage_is_invalid_format() {
        let result = decode_bytes(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_is_invalid_format() {
        assert!(matches!(decode_bytes(&[]), Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_tiff_is_unsupported() {
        let mut bytes = b"II*\0".to_vec();
        bytes.extend_from_slice(&[0u8; 32]);

        match decode_bytes(&bytes) {
            Err(DecodeError::UnsupportedFormat { format }) => assert_eq!(format, "TIFF"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_png_is_corrupted() {
        let bytes = encode_as(ImageFormat::Png);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            decode_bytes(truncated),
            Err(DecodeError::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = open(dir.path().join("missing.png"));
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop.bmp");
        std::fs::write(&path, encode_as(ImageFormat::Bmp)).unwrap();

        let source = open(&path).unwrap();
        assert_eq!(source.format(), Some(ImageFormat::Bmp));
    }
}
