//! Image preparation ahead of optical recognition.
//!
//! Decodes whatever raster format arrived, converts to 8-bit grayscale,
//! optionally downscales, and re-encodes as lossless PNG for the engine.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageOutputFormat};
use tracing::debug;

use super::ExtractionError;

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessOptions {
    /// Longest edge allowed before downscaling. `None` keeps full resolution.
    pub max_dimension: Option<u32>,
}

/// Validate image bytes before decoding.
/// Returns early error for clearly invalid input, saving decode time.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Target size when the longest edge exceeds `max_dim`; `None` when the
/// image already fits. Aspect ratio preserved, never upscales.
pub fn compute_downscale_dimensions(width: u32, height: u32, max_dim: u32) -> Option<(u32, u32)> {
    let largest = width.max(height);
    if largest <= max_dim || max_dim == 0 {
        return None;
    }

    let scale = max_dim as f32 / largest as f32;
    let new_w = ((width as f32 * scale).round() as u32).clamp(1, max_dim);
    let new_h = ((height as f32 * scale).round() as u32).clamp(1, max_dim);
    Some((new_w, new_h))
}

/// Decode, grayscale, optionally downscale, and PNG-encode an image.
///
/// CatmullRom rather than Lanczos3: no ringing around high-contrast glyph edges.
pub fn prepare_for_ocr(bytes: &[u8], options: &PreprocessOptions) -> Result<Vec<u8>, ExtractionError> {
    validate_image_bytes(bytes)?;

    let img = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::ImageProcessing(format!("Image decoding failed: {e}")))?;
    let mut gray = img.to_luma8();

    if let Some(max_dim) = options.max_dimension {
        if let Some((w, h)) = compute_downscale_dimensions(gray.width(), gray.height(), max_dim) {
            debug!(
                from = format!("{}x{}", gray.width(), gray.height()),
                to = format!("{w}x{h}"),
                "Downscaling image for OCR"
            );
            gray = image::imageops::resize(&gray, w, h, FilterType::CatmullRom);
        }
    }

    encode_png(gray)
}

/// Encode a grayscale image as PNG bytes.
pub fn encode_png(img: GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).unwrap()
    }

    #[test]
    fn rejects_tiny_input() {
        let err = validate_image_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, ExtractionError::ImageProcessing(_)));
    }

    #[test]
    fn rejects_oversized_input() {
        let big = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(validate_image_bytes(&big).is_err());
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        let garbage = vec![0x42u8; 500];
        assert!(prepare_for_ocr(&garbage, &PreprocessOptions::default()).is_err());
    }

    #[test]
    fn output_is_grayscale_png() {
        let prepared = prepare_for_ocr(&rgb_png(40, 20), &PreprocessOptions::default()).unwrap();
        assert_eq!(&prepared[..4], &[0x89, 0x50, 0x4E, 0x47]);
        let img = decode(&prepared);
        assert!(matches!(img, DynamicImage::ImageLuma8(_)));
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn downscales_when_over_limit() {
        let options = PreprocessOptions {
            max_dimension: Some(50),
        };
        let img = decode(&prepare_for_ocr(&rgb_png(200, 100), &options).unwrap());
        assert_eq!((img.width(), img.height()), (50, 25));
    }

    #[test]
    fn small_images_not_upscaled() {
        let options = PreprocessOptions {
            max_dimension: Some(1000),
        };
        let img = decode(&prepare_for_ocr(&rgb_png(30, 60), &options).unwrap());
        assert_eq!((img.width(), img.height()), (30, 60));
    }

    #[test]
    fn downscale_dimensions_preserve_aspect_ratio() {
        assert_eq!(compute_downscale_dimensions(4000, 2000, 1000), Some((1000, 500)));
        assert_eq!(compute_downscale_dimensions(1000, 3000, 1500), Some((500, 1500)));
        assert_eq!(compute_downscale_dimensions(800, 600, 1000), None);
        assert_eq!(compute_downscale_dimensions(800, 600, 0), None);
    }

    #[test]
    fn extreme_aspect_ratio_keeps_one_pixel() {
        assert_eq!(compute_downscale_dimensions(10000, 1, 100), Some((100, 1)));
    }
}
