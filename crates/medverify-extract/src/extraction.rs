//! Text and barcode extraction over the external engines.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::{BarcodeDecoder, EngineError, OcrEngine, OcrProgress};
use crate::preprocess::PreparedImage;

/// Default OCR language tag.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to encode image: {0}")]
    ImageEncode(String),

    #[error("Failed to extract text from image: {0}")]
    Ocr(#[from] EngineError),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Wraps the OCR engine and barcode decoder behind one contract.
pub struct TextExtractor<O, B> {
    ocr: O,
    barcode: B,
    language: String,
}

impl<O, B> TextExtractor<O, B>
where
    O: OcrEngine,
    B: BarcodeDecoder,
{
    /// Create an extractor using the default OCR language.
    pub fn new(ocr: O, barcode: B) -> Self {
        Self {
            ocr,
            barcode,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Use a different OCR language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Look for a barcode in the image.
    ///
    /// Absence is the common case: decoder failures are logged and reported
    /// as `None`, never as errors.
    pub async fn detect_barcode(&self, image: &PreparedImage) -> Option<String> {
        match self.barcode.decode(&image.image).await {
            Ok(Some(code)) => {
                let code = code.trim();
                if code.is_empty() {
                    debug!("Barcode decoder returned an empty code");
                    None
                } else {
                    info!("Barcode detected: {}", code);
                    Some(code.to_string())
                }
            }
            Ok(None) => {
                debug!("No barcode detected");
                None
            }
            Err(e) => {
                debug!("No barcode detected: {}", e);
                None
            }
        }
    }

    /// Recognize text in the image.
    ///
    /// `on_progress` receives the recognition fraction (0.0 - 1.0); reports
    /// from other engine phases are not forwarded.
    pub async fn extract_text<F>(
        &self,
        image: &PreparedImage,
        on_progress: F,
    ) -> ExtractionResult<String>
    where
        F: Fn(f32) + Send + Sync,
    {
        let forward = |report: OcrProgress| {
            if report.is_recognizing() {
                on_progress(report.progress.clamp(0.0, 1.0));
            }
        };

        let raw = self
            .ocr
            .recognize(&image.jpeg, &self.language, &forward)
            .await
            .map_err(|e| {
                warn!("OCR error: {}", e);
                ExtractionError::Ocr(e)
            })?;

        let text = normalize_text(&raw);
        debug!("OCR produced {} characters", text.chars().count());
        Ok(text)
    }
}

/// Normalize raw OCR output: unify line endings and strip trailing whitespace.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
