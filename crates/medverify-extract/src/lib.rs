//! Image preprocessing and text extraction for medicine verification.
//!
//! This crate wraps the two external recognition engines the verification
//! pipeline depends on:
//!
//! - an OCR engine that turns a compressed image into plain text, and
//! - a barcode decoder that turns a decoded image into a code string.
//!
//! Both are opaque async collaborators behind the [`OcrEngine`] and
//! [`BarcodeDecoder`] traits. [`TextExtractor`] normalizes their output and
//! draws the line between expected absence (no barcode) and hard failure
//! (OCR engine error).

pub mod engine;
pub mod extraction;
pub mod mock;
pub mod preprocess;

pub use engine::*;
pub use extraction::*;
pub use mock::*;
pub use preprocess::*;
