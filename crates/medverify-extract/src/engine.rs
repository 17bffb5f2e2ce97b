//! Boundary traits for the external OCR and barcode engines.

use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;

/// Status string the OCR engine reports while it is recognizing text.
pub const RECOGNIZING_TEXT: &str = "recognizing text";

/// Errors reported by an external engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Engine failure: {0}")]
    Failure(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

/// A progress report emitted by the OCR engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrProgress {
    /// Engine phase (e.g. "loading language traineddata", "recognizing text")
    pub status: String,
    /// Fraction of the phase completed (0.0 - 1.0)
    pub progress: f32,
}

impl OcrProgress {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }

    /// Whether this report belongs to the recognition phase.
    pub fn is_recognizing(&self) -> bool {
        self.status == RECOGNIZING_TEXT
    }
}

/// Optical character recognition engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in compressed image data.
    ///
    /// `language` is an engine language tag such as `"eng"`. The engine may
    /// call `progress` any number of times before returning.
    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, EngineError>;
}

/// Barcode decoder.
#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    /// Decode a barcode from the image.
    ///
    /// Returns `Ok(None)` when the image contains no code.
    async fn decode(&self, image: &DynamicImage) -> Result<Option<String>, EngineError>;
}

#[async_trait]
impl<T: OcrEngine + ?Sized> OcrEngine for Arc<T> {
    async fn recognize(
        &self,
        image: &[u8],
        language: &str,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, EngineError> {
        (**self).recognize(image, language, progress).await
    }
}

#[async_trait]
impl<T: BarcodeDecoder + ?Sized> BarcodeDecoder for Arc<T> {
    async fn decode(&self, image: &DynamicImage) -> Result<Option<String>, EngineError> {
        (**self).decode(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizing_status() {
        assert!(OcrProgress::new("recognizing text", 0.4).is_recognizing());
        assert!(!OcrProgress::new("loading language traineddata", 1.0).is_recognizing());
    }
}
