//! Verification pipeline orchestrator.
//!
//! ```text
//! image → preprocess → barcode ──(registry match)──────────────┐
//!                         │                                    │
//!                         └→ OCR → parse → analyze → validate ─┴→ results
//! ```
//!
//! Stages run strictly in sequence on one task. Any hard failure (unreadable
//! image, OCR engine error, too little text) aborts the run, fails the open
//! activity entry and leaves no partial results.

mod context;
mod events;

pub use context::RunContext;
pub use events::*;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use medverify_extract::{
    preprocess, BarcodeDecoder, ExtractionError, OcrEngine, PreparedImage, TextExtractor,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assembler::assemble;
use crate::config::{ConfigResult, VerifierConfig};
use crate::models::{FieldAnalysis, RegistryEntry, StageOutcome, VerificationResult};
use crate::parser::FieldParser;
use crate::registry::Registry;

pub const ACTION_PREPROCESSING: &str = "Image preprocessing";
pub const ACTION_BARCODE: &str = "Barcode detection";
pub const ACTION_REGISTRY: &str = "Registry validation";
pub const ACTION_OCR: &str = "OCR text extraction";
pub const ACTION_PARSING: &str = "Text parsing";
pub const ACTION_ANALYSIS: &str = "Field analysis";
pub const ACTION_COMPLETE: &str = "Verification complete";

const OCR_START_PERCENT: u8 = 40;
const OCR_SPAN_PERCENT: f32 = 30.0;

/// Pipeline errors. Only hard failures are errors; a missing barcode or
/// registry match is a normal outcome.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Could not extract meaningful text from image ({found} of {required} characters)")]
    InsufficientText { found: usize, required: usize },

    #[error("Verification timed out after {0:?}")]
    Timeout(Duration),
}

impl PipelineError {
    /// Single message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Extraction(ExtractionError::ImageDecode(_)) => {
                "Could not read the image. Please try a different photo.".to_string()
            }
            PipelineError::Extraction(_) => "Failed to extract text from image".to_string(),
            PipelineError::InsufficientText { .. } => {
                "Could not extract meaningful text from image".to_string()
            }
            PipelineError::Timeout(_) => "Verification timed out. Please try again.".to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result of the barcode stage.
#[derive(Debug)]
pub enum BarcodeOutcome<'a> {
    /// The barcode resolved to a registry entry; OCR is skipped
    Matched(&'a RegistryEntry),
    /// No barcode, or one the registry does not know
    Continue,
}

/// Runs verification over a shared registry and a pair of engines.
pub struct Verifier<O, B> {
    registry: Arc<Registry>,
    extractor: TextExtractor<O, B>,
    parser: FieldParser,
    config: VerifierConfig,
}

impl<O, B> Verifier<O, B>
where
    O: OcrEngine,
    B: BarcodeDecoder,
{
    /// Create a verifier with the default configuration.
    pub fn new(registry: Arc<Registry>, ocr: O, barcode: B) -> Self {
        let config = VerifierConfig::default();
        Self {
            registry,
            extractor: TextExtractor::new(ocr, barcode).with_language(config.ocr_language.clone()),
            parser: FieldParser::new(),
            config,
        }
    }

    /// Create a verifier with a validated configuration.
    pub fn with_config(
        registry: Arc<Registry>,
        ocr: O,
        barcode: B,
        config: VerifierConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            registry,
            extractor: TextExtractor::new(ocr, barcode).with_language(config.ocr_language.clone()),
            parser: FieldParser::new(),
            config,
        })
    }

    /// Use a customized field parser.
    pub fn with_parser(mut self, parser: FieldParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify an image on a fresh context that discards events.
    pub async fn verify(&self, image: &[u8]) -> PipelineResult<Vec<VerificationResult>> {
        let mut ctx = RunContext::new();
        self.run(&mut ctx, image).await
    }

    /// Run the pipeline, giving up after `limit`.
    ///
    /// On expiry the stage in progress is failed and the context is left
    /// idle, exactly as for any other hard failure.
    pub async fn verify_with_timeout(
        &self,
        ctx: &mut RunContext,
        image: &[u8],
        limit: Duration,
    ) -> PipelineResult<Vec<VerificationResult>> {
        let outcome = tokio::time::timeout(limit, self.run(ctx, image)).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                let err = PipelineError::Timeout(limit);
                warn!("Run {} failed: {}", ctx.run_id(), err);
                ctx.fail(err.to_string(), err.user_message());
                Err(err)
            }
        }
    }

    /// Run the pipeline on `ctx`, clearing whatever a previous run left there.
    ///
    /// Returns the verification results, which also remain in the context.
    pub async fn run(
        &self,
        ctx: &mut RunContext,
        image: &[u8],
    ) -> PipelineResult<Vec<VerificationResult>> {
        ctx.reset();
        info!("Run {} started ({} bytes)", ctx.run_id(), image.len());

        match self.execute(ctx, image).await {
            Ok(()) => {
                info!(
                    "Run {} complete with {} results",
                    ctx.run_id(),
                    ctx.results().len()
                );
                Ok(ctx.results().to_vec())
            }
            Err(err) => {
                warn!("Run {} failed: {}", ctx.run_id(), err);
                ctx.fail(err.to_string(), err.user_message());
                Err(err)
            }
        }
    }

    async fn execute(&self, ctx: &mut RunContext, image: &[u8]) -> PipelineResult<()> {
        let prepared = self.preprocess_stage(ctx, image)?;

        if let BarcodeOutcome::Matched(entry) = self.barcode_stage(ctx, &prepared).await {
            let analysis =
                FieldAnalysis::from_barcode(entry.name.clone(), self.config.barcode_confidence);
            let result = assemble(&self.registry, Some(entry), analysis);
            self.complete(ctx, vec![result]);
            return Ok(());
        }

        let text = self.ocr_stage(ctx, &prepared).await?;
        let analyses = self.analysis_stage(ctx, &text);
        let results = self.validation_stage(ctx, analyses);
        self.complete(ctx, results);
        Ok(())
    }

    fn preprocess_stage(
        &self,
        ctx: &mut RunContext,
        image: &[u8],
    ) -> PipelineResult<PreparedImage> {
        ctx.enter(Stage::Preprocessing, 10, "Optimizing image for analysis...");
        let handle = ctx.begin_stage(ACTION_PREPROCESSING);

        let prepared = preprocess(image, &self.config.preprocess)?;

        ctx.set_progress(20);
        ctx.complete_stage(
            handle,
            StageOutcome::Success,
            format!("Image optimized to {}x{}", prepared.width(), prepared.height()),
        );
        Ok(prepared)
    }

    async fn barcode_stage(
        &self,
        ctx: &mut RunContext,
        prepared: &PreparedImage,
    ) -> BarcodeOutcome<'_> {
        ctx.enter(Stage::Barcode, 30, "Scanning for barcodes...");
        let handle = ctx.begin_stage(ACTION_BARCODE);

        let Some(code) = self.extractor.detect_barcode(prepared).await else {
            ctx.complete_stage(
                handle,
                StageOutcome::Success,
                "No barcode detected, proceeding with OCR".to_string(),
            );
            return BarcodeOutcome::Continue;
        };

        let Some(entry) = self.registry.find_by_barcode(&code) else {
            debug!("Barcode {} not in registry", code);
            ctx.complete_stage(
                handle,
                StageOutcome::Success,
                format!("No medicine found for barcode {}", code),
            );
            return BarcodeOutcome::Continue;
        };

        ctx.complete_stage(
            handle,
            StageOutcome::Success,
            format!("Barcode detected: {}", code),
        );
        ctx.set_progress(90);
        ctx.record_activity(
            ACTION_REGISTRY,
            StageOutcome::Success,
            format!("Medicine found: {}", entry.name),
        );
        BarcodeOutcome::Matched(entry)
    }

    async fn ocr_stage(
        &self,
        ctx: &mut RunContext,
        prepared: &PreparedImage,
    ) -> PipelineResult<String> {
        ctx.enter(Stage::Ocr, OCR_START_PERCENT, "Extracting text from image...");
        let handle = ctx.begin_stage(ACTION_OCR);

        let sink = ctx.sink();
        let message = ctx.message().to_string();
        let latest = AtomicU8::new(OCR_START_PERCENT);

        let text = self
            .extractor
            .extract_text(prepared, |fraction| {
                let percent = ocr_percent(fraction);
                latest.store(percent, Ordering::Relaxed);
                sink.emit(PipelineEvent::Progress {
                    stage: Stage::Ocr,
                    percent,
                    message: message.clone(),
                });
            })
            .await?;
        ctx.sync_progress(latest.load(Ordering::Relaxed));

        let found = text.chars().filter(|c| !c.is_whitespace()).count();
        if found < self.config.min_text_chars {
            return Err(PipelineError::InsufficientText {
                found,
                required: self.config.min_text_chars,
            });
        }

        ctx.complete_stage(
            handle,
            StageOutcome::Success,
            format!("Extracted {} characters", text.chars().count()),
        );
        Ok(text)
    }

    fn analysis_stage(&self, ctx: &mut RunContext, text: &str) -> Vec<FieldAnalysis> {
        let candidates = self.parser.split_candidates(text);
        ctx.record_activity(
            ACTION_PARSING,
            StageOutcome::Success,
            format!("Found {} potential medicines", candidates.len()),
        );

        ctx.enter(Stage::Analysis, 70, "Analyzing prescription fields...");
        let handle = ctx.begin_stage(ACTION_ANALYSIS);

        let analyses = self.parser.analyze_candidates(&candidates);

        ctx.complete_stage(
            handle,
            StageOutcome::Success,
            format!("Analyzed {} medications", analyses.len()),
        );
        analyses
    }

    fn validation_stage(
        &self,
        ctx: &mut RunContext,
        analyses: Vec<FieldAnalysis>,
    ) -> Vec<VerificationResult> {
        ctx.enter(Stage::Validation, 85, "Validating against registry...");
        let handle = ctx.begin_stage(ACTION_REGISTRY);

        let results: Vec<VerificationResult> = analyses
            .into_iter()
            .map(|analysis| {
                let entry = self.registry.find_by_name(&analysis.medication_name);
                assemble(&self.registry, entry, analysis)
            })
            .collect();

        ctx.complete_stage(
            handle,
            StageOutcome::Success,
            format!("Validated {} medicines", results.len()),
        );
        results
    }

    fn complete(&self, ctx: &mut RunContext, results: Vec<VerificationResult>) {
        ctx.record_activity(
            ACTION_COMPLETE,
            StageOutcome::Success,
            format!("Processed {} medicines", results.len()),
        );
        ctx.finish(results);
    }
}

/// Map an OCR fraction (0.0 - 1.0) onto the 40% - 70% band.
fn ocr_percent(fraction: f32) -> u8 {
    let fraction = fraction.clamp(0.0, 1.0);
    OCR_START_PERCENT + (fraction * OCR_SPAN_PERCENT).round() as u8
}
