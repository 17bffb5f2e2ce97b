//! Compiled patterns for candidate filtering and field extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters OCR noise is reduced to: word characters, whitespace, `.` and `-`.
pub static NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.-]").expect("static regex"));

/// Lines starting with a prescription header word rather than a drug.
pub static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:dr|doctor|patient|name|age|date|address|phone|signature|hospital|clinic|rx)\b",
    )
    .expect("static regex")
});

pub static DOSAGE_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\.?\d*\s*(?:mcg|mg|ml|g)\b").expect("static regex"));

pub static FORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tab|cap|syrup|injection|cream").expect("static regex"));

pub static FREQUENCY_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)once|twice|thrice|daily|\bevery\s+\d+|\b(?:od|qd|bd|bid|td|tds|tid|qid)\b")
        .expect("static regex")
});

pub static CAPITALIZED_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]+").expect("static regex"));

/// Leading capitalized phrase of one or two words.
pub static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)").expect("static regex"));

pub static STRENGTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+\.?\d*)\s*(mcg|mg|ml|g)\b").expect("static regex"));

pub static DOSAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+\s*(?:tablets?|tabs?|capsules?|caps?|teaspoons?|ml)\b")
        .expect("static regex")
});

/// Frequency patterns with their labels, in priority order.
///
/// `$1` in a label is replaced by the pattern's first capture group.
pub const DEFAULT_FREQUENCY_PATTERNS: &[(&str, &str)] = &[
    (
        r"(?i)\bonce\s+(?:a\s+)?da(?:y|ily)\b|\b(?:od|qd)\b",
        "Once daily",
    ),
    (
        r"(?i)\btwice\s+(?:a\s+)?da(?:y|ily)\b|\b(?:bd|bid)\b",
        "Twice daily",
    ),
    (
        r"(?i)\b(?:thrice|three\s+times)\s+(?:a\s+)?da(?:y|ily)\b|\b(?:td|tds|tid)\b",
        "Three times daily",
    ),
    (
        r"(?i)\bfour\s+times\s+(?:a\s+)?da(?:y|ily)\b|\bqid\b",
        "Four times daily",
    ),
    (
        r"(?i)\bevery\s+(\d+)\s*(?:hours?|hrs?|h)\b",
        "Every $1 hours",
    ),
];
