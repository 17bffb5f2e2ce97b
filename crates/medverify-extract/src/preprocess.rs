//! Image preprocessing ahead of barcode detection and OCR.
//!
//! Decodes the raw upload, caps the long edge, and re-encodes the result as
//! JPEG so the OCR engine always receives compact, bounded input.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extraction::{ExtractionError, ExtractionResult};

/// Default long-edge cap in pixels.
pub const DEFAULT_MAX_EDGE: u32 = 1920;

/// Default JPEG quality (0-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Preprocessing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Maximum width and height in pixels
    pub max_edge: u32,
    /// JPEG re-encoding quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// An image ready for extraction.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Decoded (and possibly downscaled) pixels, handed to the barcode decoder
    pub image: DynamicImage,
    /// JPEG-compressed pixels, handed to the OCR engine
    pub jpeg: Vec<u8>,
    /// Width before downscaling
    pub original_width: u32,
    /// Height before downscaling
    pub original_height: u32,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the image was downscaled during preprocessing.
    pub fn was_resized(&self) -> bool {
        self.width() != self.original_width || self.height() != self.original_height
    }
}

/// Compute dimensions that fit within `max_edge` while preserving aspect ratio.
///
/// Dimensions already within bounds are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width <= max_edge && height <= max_edge {
        return (width, height);
    }
    let ratio = f64::min(
        f64::from(max_edge) / f64::from(width),
        f64::from(max_edge) / f64::from(height),
    );
    let scaled = |v: u32| ((f64::from(v) * ratio).round() as u32).clamp(1, max_edge);
    (scaled(width), scaled(height))
}

/// Decode, downscale and compress a raw image payload.
pub fn preprocess(bytes: &[u8], config: &PreprocessConfig) -> ExtractionResult<PreparedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::ImageDecode(e.to_string()))?;

    let (original_width, original_height) = (decoded.width(), decoded.height());
    let (width, height) = fit_within(original_width, original_height, config.max_edge);

    let image = if (width, height) == (original_width, original_height) {
        decoded
    } else {
        debug!(
            "Downscaling image {}x{} -> {}x{}",
            original_width, original_height, width, height
        );
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    let jpeg = encode_jpeg(&image, config.jpeg_quality)?;

    Ok(PreparedImage {
        image,
        jpeg,
        original_width,
        original_height,
    })
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> ExtractionResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|e| ExtractionError::ImageEncode(e.to_string()))?;
    Ok(buffer)
}
