//! Result assembly: trust score, safety alerts and alternatives.

use tracing::debug;

use crate::models::{Alert, FieldAnalysis, RegistryEntry, VerificationResult};
use crate::registry::Registry;

/// Analyses below this confidence get a "verify with pharmacist" warning.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Registry names suggested for an unmatched medication.
pub const MAX_SUGGESTIONS: usize = 3;

pub const NOT_FOUND_MESSAGE: &str =
    "Medicine not found in registry. Please verify authenticity with healthcare provider.";

pub const LOW_CONFIDENCE_MESSAGE: &str =
    "Low confidence in prescription analysis. Please verify with pharmacist.";

/// Build the verification result for one analysis and its registry match.
///
/// Alerts are ordered: counterfeit error, unverified warning, approval
/// warning, low-confidence warning, one info per analysis flag, then the
/// success alert. An absent entry gets only the not-found error.
pub fn assemble(
    registry: &Registry,
    entry: Option<&RegistryEntry>,
    analysis: FieldAnalysis,
) -> VerificationResult {
    let authenticity_score = Registry::trust_score(entry);

    let Some(entry) = entry else {
        let suggestions = registry.closest_names(&analysis.medication_name, MAX_SUGGESTIONS);
        debug!(
            "No registry match for '{}' ({} suggestions)",
            analysis.medication_name,
            suggestions.len()
        );
        return VerificationResult {
            entry: None,
            analysis,
            authenticity_score,
            alerts: vec![Alert::error(NOT_FOUND_MESSAGE)],
            alternatives: Vec::new(),
            suggestions,
        };
    };

    let alerts = build_alerts(entry, &analysis);
    let alternatives = registry
        .alternatives(entry)
        .into_iter()
        .cloned()
        .collect();

    VerificationResult {
        entry: Some(entry.clone()),
        analysis,
        authenticity_score,
        alerts,
        alternatives,
        suggestions: Vec::new(),
    }
}

fn build_alerts(entry: &RegistryEntry, analysis: &FieldAnalysis) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if entry.is_counterfeit() {
        alerts.push(Alert::error(format!(
            "COUNTERFEIT DETECTED: {} is flagged as counterfeit. DO NOT USE.",
            entry.name
        )));
    }

    if entry.is_unverified() {
        alerts.push(Alert::warning(format!(
            "{} is not verified. Registration may be expired or invalid.",
            entry.name
        )));
    }

    if !entry.regulatory_approved {
        alerts.push(Alert::warning(format!(
            "{} is not regulator-approved. Use with caution.",
            entry.name
        )));
    }

    if analysis.confidence < LOW_CONFIDENCE_THRESHOLD {
        alerts.push(Alert::warning(LOW_CONFIDENCE_MESSAGE));
    }

    alerts.extend(analysis.flags.iter().map(Alert::info));

    if entry.is_safe() {
        alerts.push(Alert::success(format!(
            "{} is verified and regulator-approved.",
            entry.name
        )));
    }

    alerts
}
