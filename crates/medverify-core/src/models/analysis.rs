//! Field analysis extracted from a candidate line.

use serde::{Deserialize, Serialize};

/// Confidence before any missing-field penalty, in tenths.
pub const BASE_CONFIDENCE_TENTHS: u8 = 7;

/// Confidence assigned when no medication could be identified.
pub const UNKNOWN_CONFIDENCE: f64 = 0.3;

/// Name of the sentinel analysis.
pub const UNKNOWN_MEDICATION: &str = "Unknown";

pub const FLAG_MISSING_STRENGTH: &str = "Strength not clearly specified";
pub const FLAG_MISSING_FREQUENCY: &str = "Dosage frequency unclear";
pub const FLAG_MISSING_DOSAGE: &str = "Dosage amount not specified";
pub const FLAG_UNIDENTIFIED: &str = "Could not identify medication from text";

/// Parsed medication fields for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldAnalysis {
    /// Candidate medication name
    pub medication_name: String,
    /// Strength (e.g., "500mg")
    pub strength: Option<String>,
    /// Dosage amount (e.g., "1 tablet")
    pub dosage: Option<String>,
    /// Frequency label (e.g., "Twice daily")
    pub frequency: Option<String>,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Missing or ambiguous fields, in detection order
    pub flags: Vec<String>,
}

impl FieldAnalysis {
    /// Build an analysis from parsed fields, applying one 0.1 penalty and
    /// one flag per missing field.
    pub fn from_fields(
        medication_name: String,
        strength: Option<String>,
        frequency: Option<String>,
        dosage: Option<String>,
    ) -> Self {
        let mut flags = Vec::new();
        if strength.is_none() {
            flags.push(FLAG_MISSING_STRENGTH.to_string());
        }
        if frequency.is_none() {
            flags.push(FLAG_MISSING_FREQUENCY.to_string());
        }
        if dosage.is_none() {
            flags.push(FLAG_MISSING_DOSAGE.to_string());
        }

        // Whole tenths keep thresholds like 0.5 exact
        let tenths = BASE_CONFIDENCE_TENTHS - flags.len() as u8;

        Self {
            medication_name,
            strength,
            dosage,
            frequency,
            confidence: f64::from(tenths) / 10.0,
            flags,
        }
    }

    /// The analysis reported when no candidate yields a medication.
    pub fn unknown() -> Self {
        Self {
            medication_name: UNKNOWN_MEDICATION.to_string(),
            strength: None,
            dosage: None,
            frequency: None,
            confidence: UNKNOWN_CONFIDENCE,
            flags: vec![FLAG_UNIDENTIFIED.to_string()],
        }
    }

    /// The analysis attached to a barcode match: the registry names the
    /// medication, so nothing is flagged.
    pub fn from_barcode(medication_name: String, confidence: f64) -> Self {
        Self {
            medication_name,
            strength: None,
            dosage: None,
            frequency: None,
            confidence,
            flags: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.medication_name == UNKNOWN_MEDICATION && self.confidence == UNKNOWN_CONFIDENCE
    }
}
