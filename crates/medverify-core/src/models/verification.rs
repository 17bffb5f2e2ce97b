//! Verification result models.

use serde::{Deserialize, Serialize};

use super::analysis::FieldAnalysis;
use super::registry::RegistryEntry;

/// Alert severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
    Success,
}

/// A user-facing safety alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub message: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl Alert {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Success, message)
    }
}

/// The verification outcome for one detected medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    /// Matched registry entry, `None` when the registry has no match
    pub entry: Option<RegistryEntry>,
    /// Parsed fields for the candidate
    pub analysis: FieldAnalysis,
    /// Trust score (0 - 100)
    pub authenticity_score: u8,
    /// Alerts in severity-group order
    pub alerts: Vec<Alert>,
    /// Verified, approved alternatives for an unsafe match
    pub alternatives: Vec<RegistryEntry>,
    /// Registry names resembling an unmatched medication name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl VerificationResult {
    pub fn is_matched(&self) -> bool {
        self.entry.is_some()
    }

    /// Check if any alert has error severity.
    pub fn has_errors(&self) -> bool {
        self.alerts
            .iter()
            .any(|a| a.severity == AlertSeverity::Error)
    }

    /// Count alerts of the given severity.
    pub fn count_alerts(&self, severity: AlertSeverity) -> usize {
        self.alerts.iter().filter(|a| a.severity == severity).count()
    }
}
