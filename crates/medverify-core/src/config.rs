//! Configuration for the verifier.

use std::path::Path;

use medverify_extract::{PreprocessConfig, DEFAULT_LANGUAGE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum non-whitespace characters OCR must produce.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 5;

/// Default confidence attached to a barcode-matched analysis.
pub const DEFAULT_BARCODE_CONFIDENCE: f64 = 0.95;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration for the verification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Image preprocessing settings
    pub preprocess: PreprocessConfig,

    /// OCR engine language tag
    pub ocr_language: String,

    /// Minimum non-whitespace characters for OCR text to be usable
    pub min_text_chars: usize,

    /// Confidence of the analysis attached to a barcode match (0.0 - 1.0)
    pub barcode_confidence: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            ocr_language: DEFAULT_LANGUAGE.to_string(),
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            barcode_confidence: DEFAULT_BARCODE_CONFIDENCE,
        }
    }
}

impl VerifierConfig {
    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.preprocess.max_edge == 0 {
            return Err(ConfigError::Invalid(
                "preprocess.max_edge must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.preprocess.jpeg_quality) {
            return Err(ConfigError::Invalid(
                "preprocess.jpeg_quality must be between 1 and 100".to_string(),
            ));
        }
        if self.ocr_language.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr_language must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.barcode_confidence) {
            return Err(ConfigError::Invalid(
                "barcode_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = VerifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.min_text_chars, 5);
        assert_eq!(config.preprocess.max_edge, 1920);
        assert_eq!(config.preprocess.jpeg_quality, 85);
    }

    #[test]
    fn test_invalid_jpeg_quality() {
        let mut config = VerifierConfig::default();
        config.preprocess.jpeg_quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_barcode_confidence() {
        let mut config = VerifierConfig::default();
        config.barcode_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = VerifierConfig::from_toml(
            r#"
            ocr_language = "urd"

            [preprocess]
            max_edge = 1024
            "#,
        )
        .unwrap();

        assert_eq!(config.ocr_language, "urd");
        assert_eq!(config.preprocess.max_edge, 1024);
        assert_eq!(config.preprocess.jpeg_quality, 85);
        assert_eq!(config.min_text_chars, 5);
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let result = VerifierConfig::from_toml("ocr_language = \"  \"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = VerifierConfig::from_toml("min_text_chars = \"five\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = VerifierConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = VerifierConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "min_text_chars = 12").unwrap();

        let config = VerifierConfig::load(file.path()).unwrap();
        assert_eq!(config.min_text_chars, 12);

        assert!(matches!(
            VerifierConfig::load("/nonexistent/medverify.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
