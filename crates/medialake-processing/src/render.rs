//! Blocking-pool offload for image work.
//!
//! Decode and resize are CPU-bound; running them on the async scheduler
//! would stall unrelated requests, so every render goes through
//! `tokio::task::spawn_blocking`.

use bytes::Bytes;
use medialake_core::config::PreviewConfig;
use medialake_core::AppError;

use crate::transform::{ImageTransformer, RenderedPreview, RenderedVariant};

/// Render the fixed-box preview on a blocking worker.
pub async fn render_preview(
    data: Bytes,
    config: PreviewConfig,
) -> Result<RenderedPreview, AppError> {
    tokio::task::spawn_blocking(move || ImageTransformer::preview(&data, &config))
        .await
        .map_err(|e| AppError::Internal(format!("Preview render task panicked: {}", e)))?
}

/// Render one coefficient-scaled variant on a blocking worker.
pub async fn render_variant(
    data: Bytes,
    coefficient: f64,
    content_type: String,
) -> Result<RenderedVariant, AppError> {
    tokio::task::spawn_blocking(move || {
        ImageTransformer::scaled_variant(&data, coefficient, &content_type)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Variant render task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use medialake_core::config::FitMode;
    use std::io::Cursor;

    fn png_fixture(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer)
    }

    #[tokio::test]
    async fn test_render_preview_offloaded() {
        let preview = render_preview(
            png_fixture(400, 400),
            PreviewConfig {
                width: 100,
                height: 100,
                fit: FitMode::Fill,
            },
        )
        .await
        .unwrap();
        assert_eq!(preview.preview.width, 100);
        assert_eq!(preview.preview.height, 100);
    }

    #[tokio::test]
    async fn test_render_variant_offloaded() {
        let variant = render_variant(png_fixture(100, 80), 0.25, "image/png".to_string())
            .await
            .unwrap();
        assert_eq!(variant.dimensions.width, 25);
        assert_eq!(variant.dimensions.height, 20);
    }
}
