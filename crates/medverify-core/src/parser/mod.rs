//! Rule-based prescription field parser.
//!
//! Pipeline: OCR text → candidate lines → per-line field analysis
//!
//! Handles:
//! - Noise and header filtering (doctor/patient/date lines)
//! - Medication name, strength, dosage and frequency extraction
//! - Confidence penalties and flags for missing fields

mod patterns;

pub use patterns::DEFAULT_FREQUENCY_PATTERNS;

use regex::Regex;
use tracing::debug;

use crate::models::FieldAnalysis;
use patterns::*;

/// Shortest line (in characters) considered a candidate.
const MIN_LINE_CHARS: usize = 3;

/// Indicators a line needs to count as a candidate.
const MIN_INDICATORS: usize = 2;

/// A frequency pattern and the label it produces.
#[derive(Debug, Clone)]
struct FrequencyPattern {
    pattern: Regex,
    label: String,
}

/// Parser for medication fields in OCR text.
#[derive(Debug, Clone)]
pub struct FieldParser {
    /// Ordered frequency patterns: first match wins
    frequency_patterns: Vec<FrequencyPattern>,
}

impl Default for FieldParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldParser {
    /// Create a parser with the default frequency patterns.
    pub fn new() -> Self {
        let frequency_patterns = DEFAULT_FREQUENCY_PATTERNS
            .iter()
            .map(|(pattern, label)| FrequencyPattern {
                pattern: Regex::new(pattern).expect("static regex"),
                label: (*label).to_string(),
            })
            .collect();
        Self { frequency_patterns }
    }

    /// Append a frequency pattern, checked after the existing ones.
    pub fn add_frequency_pattern(&mut self, pattern: &str, label: &str) -> Result<(), regex::Error> {
        self.frequency_patterns.push(FrequencyPattern {
            pattern: Regex::new(pattern)?,
            label: label.to_string(),
        });
        Ok(())
    }

    /// Split OCR text into lines likely to describe a medication.
    pub fn split_candidates(&self, text: &str) -> Vec<String> {
        let cleaned = NOISE_RE.replace_all(text, " ");

        cleaned
            .lines()
            .map(str::trim)
            .filter(|line| line.chars().count() >= MIN_LINE_CHARS)
            .filter(|line| !HEADER_RE.is_match(line))
            .filter(|line| count_indicators(line) >= MIN_INDICATORS)
            .map(str::to_string)
            .collect()
    }

    /// Extract medication fields from one candidate line.
    ///
    /// Returns `None` when no medication name can be found.
    pub fn analyze_candidate(&self, line: &str) -> Option<FieldAnalysis> {
        let line = line.trim();
        let name = extract_name(line)?;

        Some(FieldAnalysis::from_fields(
            name,
            extract_strength(line),
            self.extract_frequency(line),
            extract_dosage(line),
        ))
    }

    /// Analyze every candidate in the text.
    ///
    /// Never returns an empty list: if nothing is identified, the single
    /// "Unknown" analysis is returned instead.
    pub fn analyze_text(&self, text: &str) -> Vec<FieldAnalysis> {
        self.analyze_candidates(&self.split_candidates(text))
    }

    /// Analyze already-split candidate lines, with the same fallback as
    /// [`FieldParser::analyze_text`].
    pub fn analyze_candidates(&self, candidates: &[String]) -> Vec<FieldAnalysis> {
        let analyses: Vec<FieldAnalysis> = candidates
            .iter()
            .filter_map(|line| self.analyze_candidate(line))
            .collect();

        if analyses.is_empty() {
            debug!("No medication identified in {} candidate lines", candidates.len());
            return vec![FieldAnalysis::unknown()];
        }
        analyses
    }

    /// Match the frequency patterns in order and return the first label.
    pub fn extract_frequency(&self, line: &str) -> Option<String> {
        self.frequency_patterns.iter().find_map(|fp| {
            fp.pattern.captures(line).map(|caps| {
                let mut label = String::new();
                caps.expand(&fp.label, &mut label);
                label
            })
        })
    }
}

/// Count medication indicators on a line.
fn count_indicators(line: &str) -> usize {
    [
        DOSAGE_UNIT_RE.is_match(line),
        FORM_RE.is_match(line),
        FREQUENCY_HINT_RE.is_match(line),
        CAPITALIZED_START_RE.is_match(line),
    ]
    .iter()
    .filter(|hit| **hit)
    .count()
}

/// Medication name: leading capitalized phrase, else the first capitalized
/// word of four or more characters, else the first word.
pub fn extract_name(line: &str) -> Option<String> {
    if let Some(caps) = NAME_RE.captures(line) {
        return Some(caps[1].to_string());
    }

    let mut words = line.split_whitespace();
    let first = words.clone().next()?;
    let capitalized = words.find(|w| {
        w.chars().count() > 3 && w.chars().next().is_some_and(|c| c.is_ascii_uppercase())
    });
    Some(capitalized.unwrap_or(first).to_string())
}

/// Strength as `<number><unit>`, e.g. "500mg".
pub fn extract_strength(line: &str) -> Option<String> {
    STRENGTH_RE
        .captures(line)
        .map(|caps| format!("{}{}", &caps[1], &caps[2]))
}

/// Dosage as `<count> <form>`, e.g. "1 tablet".
pub fn extract_dosage(line: &str) -> Option<String> {
    DOSAGE_RE.find(line).map(|m| m.as_str().to_string())
}
