//! MedVerify Core Library
//!
//! Medicine authenticity verification from prescription, barcode and package
//! images.
//!
//! # Architecture
//!
//! ```text
//! Image → Preprocess → Barcode detection
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │                           │
//!       registry match                 no match
//!              │                           │
//!              │                OCR → Field parsing → Field analysis
//!              │                           │
//!              │                  per-candidate name lookup
//!              │                           │
//!              └─────────────┬─────────────┘
//!                            ▼
//!             ┌──────────────────────────────┐
//!             │       Result assembly        │
//!             │  trust score (0 - 100)       │
//!             │  alerts, safer alternatives  │
//!             └──────────────┬───────────────┘
//!                            ▼
//!                  VerificationResult[]
//! ```
//!
//! # Core Principle
//!
//! **Absence is not failure.** A missing barcode or an unmatched medicine is a
//! normal outcome reported through alerts; only an unreadable image or failed
//! OCR aborts a run.
//!
//! # Modules
//!
//! - [`models`]: Domain types (RegistryEntry, FieldAnalysis, VerificationResult, ActivityLog)
//! - [`registry`]: Reference drug registry with name, barcode and fuzzy lookup
//! - [`parser`]: Rule-based prescription field parser
//! - [`assembler`]: Trust scoring, safety alerts and alternatives
//! - [`pipeline`]: Staged verification run with progress and activity events
//! - [`config`]: TOML configuration

pub mod assembler;
pub mod config;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod registry;

// Re-export commonly used types
pub use assembler::assemble;
pub use config::{ConfigError, VerifierConfig};
pub use models::{
    ActivityEntry, ActivityLog, ActivityStatus, Alert, AlertSeverity, AuthenticityStatus,
    FieldAnalysis, RegistryEntry, VerificationResult,
};
pub use parser::FieldParser;
pub use pipeline::{
    BarcodeOutcome, EventSink, PipelineError, PipelineEvent, RunContext, Stage, Verifier,
};
pub use registry::{Registry, RegistryError};
