//! Image transformer
//!
//! Synchronous, CPU-bound image operations: decode, fixed-box preview,
//! coefficient-scaled variants. Callers run these on a blocking worker via
//! the `render` module.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use medialake_core::config::{FitMode, PreviewConfig};
use medialake_core::models::Dimensions;
use medialake_core::AppError;
use std::io::Cursor;

/// Preview render output: encoded PNG plus the source and preview box sizes.
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub bytes: Bytes,
    pub original: Dimensions,
    pub preview: Dimensions,
}

/// Variant render output: re-encoded bytes at the scaled size.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub bytes: Bytes,
    pub dimensions: Dimensions,
}

/// Static image transform operations.
pub struct ImageTransformer;

impl ImageTransformer {
    /// Decode the image and report its pixel dimensions.
    pub fn probe(data: &[u8]) -> Result<Dimensions, AppError> {
        let img = Self::decode(data)?;
        let (width, height) = img.dimensions();
        Ok(Dimensions { width, height })
    }

    /// Render the fixed-box preview, always encoded as PNG.
    ///
    /// `Fill` covers the whole box (center-cropping overflow); `Inside`
    /// fits within it preserving aspect ratio.
    pub fn preview(data: &[u8], config: &PreviewConfig) -> Result<RenderedPreview, AppError> {
        let img = Self::decode(data)?;
        let (width, height) = img.dimensions();
        let original = Dimensions { width, height };

        let filter = Self::select_filter(config.width, config.height);
        let resized = match config.fit {
            FitMode::Fill => img.resize_to_fill(config.width, config.height, filter),
            FitMode::Inside => img.resize(config.width, config.height, filter),
        };

        let (preview_width, preview_height) = resized.dimensions();
        let bytes = Self::encode(&resized, ImageFormat::Png)?;

        Ok(RenderedPreview {
            bytes,
            original,
            preview: Dimensions {
                width: preview_width,
                height: preview_height,
            },
        })
    }

    /// Render one size variant by scaling both axes with `coefficient`,
    /// re-encoded in the source's declared format.
    pub fn scaled_variant(
        data: &[u8],
        coefficient: f64,
        content_type: &str,
    ) -> Result<RenderedVariant, AppError> {
        let img = Self::decode(data)?;
        let (width, height) = img.dimensions();

        let target_width = Self::scale_axis(width, coefficient);
        let target_height = Self::scale_axis(height, coefficient);

        let filter = Self::select_filter(target_width, target_height);
        let resized = img.resize_exact(target_width, target_height, filter);

        let format = Self::detect_format(content_type);
        let bytes = Self::encode(&resized, format)?;

        Ok(RenderedVariant {
            bytes,
            dimensions: Dimensions {
                width: target_width,
                height: target_height,
            },
        })
    }

    /// Image format implied by a declared content type.
    pub fn detect_format(content_type: &str) -> ImageFormat {
        match content_type {
            "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/gif" => ImageFormat::Gif,
            "image/webp" => ImageFormat::WebP,
            "image/tiff" => ImageFormat::Tiff,
            _ => ImageFormat::Jpeg,
        }
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, AppError> {
        image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| AppError::ImageProcessing(format!("Format detection failed: {}", e)))?
            .decode()
            .map_err(|e| AppError::ImageProcessing(format!("Decode failed: {}", e)))
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Bytes, AppError> {
        let (width, height) = img.dimensions();
        let estimated_size = (width * height * 3) as usize;
        let mut buffer = Vec::with_capacity(estimated_size);
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, format)
            .map_err(|e| AppError::ImageProcessing(format!("Encode failed: {}", e)))?;
        Ok(Bytes::from(buffer))
    }

    fn scale_axis(axis: u32, coefficient: f64) -> u32 {
        ((axis as f64 * coefficient).round() as u32).max(1)
    }

    /// Cheaper filter for small targets, Lanczos for everything else.
    fn select_filter(width: u32, height: u32) -> FilterType {
        if width <= 256 || height <= 256 {
            FilterType::Triangle
        } else {
            FilterType::Lanczos3
        }
    }
}
