//! Image transcoding: decode, downscale to the width limit, re-encode as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{LimitsConfig, TranscodeConfig};
use crate::error::{UploadError, UploadResult, ValidationRule};

/// Extension of every optimized artifact.
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Content type of every optimized artifact.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Resizes and recompresses uploads.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscodeConfig,
    limits: LimitsConfig,
}

/// Result of transcoding an image.
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    /// Encoded output bytes
    pub data: Vec<u8>,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Width of the decoded input
    pub source_width: u32,
    /// Height of the decoded input
    pub source_height: u32,
    /// Detected input format
    pub source_format: ImageFormat,
}

/// Output dimensions for a `width`×`height` input under `max_width`.
///
/// Aspect ratio is preserved and images are never upscaled.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

impl Transcoder {
    /// Create a new transcoder with the given settings and limits.
    pub fn new(config: TranscodeConfig, limits: LimitsConfig) -> Self {
        Self { config, limits }
    }

    /// Transcode an in-memory image on the blocking pool, with timeout.
    pub async fn transcode(&self, bytes: Vec<u8>) -> UploadResult<TranscodedImage> {
        let timeout_duration = Duration::from_millis(self.limits.transcode_timeout_ms);
        let config = self.config.clone();
        let max_dimension = self.limits.max_image_dimension;

        let result = timeout(timeout_duration, async {
            tokio::task::spawn_blocking(move || {
                Self::transcode_sync(&bytes, &config, max_dimension)
            })
            .await
        })
        .await;

        match result {
            Ok(Ok(transcoded)) => transcoded,
            Ok(Err(e)) => Err(UploadError::TranscodeFailed {
                message: format!("Task join error: {e}"),
            }),
            Err(_) => Err(UploadError::TranscodeFailed {
                message: format!(
                    "Timed out after {}ms",
                    self.limits.transcode_timeout_ms
                ),
            }),
        }
    }

    /// Synchronous transcode (runs in spawn_blocking).
    fn transcode_sync(
        bytes: &[u8],
        config: &TranscodeConfig,
        max_dimension: u32,
    ) -> UploadResult<TranscodedImage> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| UploadError::TranscodeFailed {
                message: format!("Cannot detect image format: {e}"),
            })?;
        let source_format = reader.format().ok_or_else(|| UploadError::TranscodeFailed {
            message: "Unrecognized image format".to_string(),
        })?;

        // Check dimensions from the header before allocating pixels.
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| UploadError::TranscodeFailed {
                message: e.to_string(),
            })?;
        if width > max_dimension || height > max_dimension {
            return Err(UploadError::validation(
                ValidationRule::Dimensions,
                format!("Image is {width}x{height}, the limit is {max_dimension}px per side"),
            ));
        }

        let image = image::load_from_memory_with_format(bytes, source_format).map_err(|e| {
            UploadError::TranscodeFailed {
                message: e.to_string(),
            }
        })?;
        let (source_width, source_height) = image.dimensions();

        let (target_width, target_height) =
            target_dimensions(source_width, source_height, config.max_width);
        let resized = if target_width == source_width {
            image
        } else {
            image.resize_exact(target_width, target_height, FilterType::Lanczos3)
        };

        let data = Self::encode(&resized, config.quality)?;

        Ok(TranscodedImage {
            data,
            width: target_width,
            height: target_height,
            source_width,
            source_height,
            source_format,
        })
    }

    /// Encode as JPEG at the given quality. Alpha is dropped.
    fn encode(image: &DynamicImage, quality: u8) -> UploadResult<Vec<u8>> {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let mut buffer = Cursor::new(Vec::new());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
            .map_err(|e| UploadError::TranscodeFailed {
                message: format!("Encode failed: {e}"),
            })?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgba8(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn transcoder(max_width: u32) -> Transcoder {
        Transcoder::new(
            TranscodeConfig {
                max_width,
                quality: 80,
            },
            LimitsConfig::default(),
        )
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(3000, 2000, 2000), (2000, 1333));
        assert_eq!(target_dimensions(1600, 900, 2000), (1600, 900));
        assert_eq!(target_dimensions(2000, 10, 2000), (2000, 10));
        assert_eq!(target_dimensions(10000, 1, 100), (100, 1));
    }

    #[tokio::test]
    async fn test_downscales_wide_image() {
        let result = transcoder(2000).transcode(png_bytes(3000, 2000)).await.unwrap();
        assert_eq!((result.width, result.height), (2000, 1333));
        assert_eq!((result.source_width, result.source_height), (3000, 2000));
        assert_eq!(result.source_format, ImageFormat::Png);

        let output = image::load_from_memory(&result.data).unwrap();
        assert_eq!(output.dimensions(), (2000, 1333));
        assert_eq!(
            image::guess_format(&result.data).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn test_never_upscales() {
        let result = transcoder(2000).transcode(png_bytes(640, 480)).await.unwrap();
        assert_eq!((result.width, result.height), (640, 480));
        assert_eq!(&result.data[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_corrupt_image_fails() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(40);
        let err = transcoder(2000).transcode(bytes).await.unwrap_err();
        assert!(matches!(err, UploadError::TranscodeFailed { .. }));

        let err = transcoder(2000)
            .transcode(b"definitely not an image".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TranscodeFailed { .. }));
    }

    #[tokio::test]
    async fn test_rejects_oversized_dimensions() {
        let limits = LimitsConfig {
            max_image_dimension: 100,
            ..Default::default()
        };
        let transcoder = Transcoder::new(TranscodeConfig::default(), limits);
        let err = transcoder.transcode(png_bytes(200, 50)).await.unwrap_err();
        assert_eq!(err.rule(), Some(ValidationRule::Dimensions));
    }
}
