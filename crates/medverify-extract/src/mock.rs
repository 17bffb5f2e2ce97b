//! Deterministic engines for testing without a real OCR or barcode backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::DynamicImage;

use crate::engine::{BarcodeDecoder, EngineError, OcrEngine, OcrProgress, RECOGNIZING_TEXT};

/// Scripted outcome of a mock engine call.
#[derive(Debug, Clone)]
enum Scripted<T> {
    Succeed(T),
    Fail(String),
}

/// Mock OCR engine returning a fixed text or a fixed failure.
#[derive(Debug)]
pub struct MockOcrEngine {
    outcome: Scripted<String>,
    progress_steps: Vec<f32>,
    calls: AtomicUsize,
    last_language: Mutex<Option<String>>,
}

impl MockOcrEngine {
    /// Engine that recognizes `text` in any image.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::scripted(Scripted::Succeed(text.into()))
    }

    /// Engine that fails on every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(Scripted::Fail(message.into()))
    }

    fn scripted(outcome: Scripted<String>) -> Self {
        Self {
            outcome,
            progress_steps: vec![0.5, 1.0],
            calls: AtomicUsize::new(0),
            last_language: Mutex::new(None),
        }
    }

    /// Recognition progress fractions to report on each call.
    pub fn with_progress_steps(mut self, steps: Vec<f32>) -> Self {
        self.progress_steps = steps;
        self
    }

    /// Number of times `recognize` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Language tag passed to the most recent call.
    pub fn last_language(&self) -> Option<String> {
        self.last_language
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl OcrEngine for MockOcrEngine {
    async fn recognize(
        &self,
        _image: &[u8],
        language: &str,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_language.lock() {
            *last = Some(language.to_string());
        }

        progress(OcrProgress::new("initializing api", 1.0));

        match &self.outcome {
            Scripted::Succeed(text) => {
                for step in &self.progress_steps {
                    progress(OcrProgress::new(RECOGNIZING_TEXT, *step));
                }
                Ok(text.clone())
            }
            Scripted::Fail(message) => Err(EngineError::Failure(message.clone())),
        }
    }
}

/// Mock barcode decoder returning a fixed code, nothing, or a failure.
#[derive(Debug)]
pub struct MockBarcodeDecoder {
    outcome: Scripted<Option<String>>,
    calls: AtomicUsize,
}

impl MockBarcodeDecoder {
    /// Decoder that finds `code` in any image.
    pub fn with_code(code: impl Into<String>) -> Self {
        Self::scripted(Scripted::Succeed(Some(code.into())))
    }

    /// Decoder that never finds a code.
    pub fn none() -> Self {
        Self::scripted(Scripted::Succeed(None))
    }

    /// Decoder that errors on every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(Scripted::Fail(message.into()))
    }

    fn scripted(outcome: Scripted<Option<String>>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `decode` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarcodeDecoder for MockBarcodeDecoder {
    async fn decode(&self, _image: &DynamicImage) -> Result<Option<String>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Scripted::Succeed(code) => Ok(code.clone()),
            Scripted::Fail(message) => Err(EngineError::Failure(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_ocr_counts_calls() {
        let engine = MockOcrEngine::with_text("Panadol 500mg");
        let reports = Mutex::new(Vec::new());

        let text = engine
            .recognize(&[], "eng", &|p: OcrProgress| reports.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(text, "Panadol 500mg");
        assert_eq!(engine.call_count(), 1);
        assert_eq!(reports.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_ocr_failure_reports_no_recognition() {
        let engine = MockOcrEngine::failing("boom");
        let reports = Mutex::new(Vec::new());

        let result = engine
            .recognize(&[], "eng", &|p: OcrProgress| reports.lock().unwrap().push(p))
            .await;

        assert_eq!(result, Err(EngineError::Failure("boom".into())));
        assert!(reports.lock().unwrap().iter().all(|p| !p.is_recognizing()));
    }

    #[tokio::test]
    async fn test_mock_barcode_outcomes() {
        let image = DynamicImage::new_rgb8(4, 4);

        assert_eq!(
            MockBarcodeDecoder::with_code("123").decode(&image).await,
            Ok(Some("123".into()))
        );
        assert_eq!(MockBarcodeDecoder::none().decode(&image).await, Ok(None));
        assert!(MockBarcodeDecoder::failing("x").decode(&image).await.is_err());
    }
}
