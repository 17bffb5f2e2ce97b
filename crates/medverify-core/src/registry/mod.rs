//! Reference drug registry.
//!
//! Read-only reference data loaded once per process. Lookups never fail for
//! absent data: a miss is `None`, not an error.
//!
//! Trust score weights:
//! - Regulatory approval: 30
//! - Valid registration number: 40
//! - Authenticity status: 30 verified, 10 unverified, 0 counterfeit

mod matching;

pub use matching::*;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{AuthenticityStatus, RegistryEntry};

/// Points for regulatory approval.
const APPROVAL_POINTS: u8 = 30;

/// Points for a valid registration number.
const REGISTRATION_POINTS: u8 = 40;

/// Minimum similarity for a name to be suggested.
const MIN_SUGGESTION_SIMILARITY: f64 = 0.80;

/// Registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid registry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// On-disk layouts accepted by the loader.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    Wrapped { medicines: Vec<RegistryEntry> },
    Bare(Vec<RegistryEntry>),
}

/// Immutable, key-indexed collection of registry entries.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    /// barcode → index of the first entry carrying it
    barcode_index: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry from entries, preserving their order.
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        let mut barcode_index = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            if let Some(code) = &entry.barcode {
                barcode_index.entry(code.clone()).or_insert(idx);
            }
        }
        Self {
            entries,
            barcode_index,
        }
    }

    /// Parse a registry from JSON: `{"medicines": [...]}` or a bare array.
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        let entries = match serde_json::from_str(json)? {
            RegistryDocument::Wrapped { medicines } => medicines,
            RegistryDocument::Bare(entries) => entries,
        };
        debug!("Loaded {} registry entries", entries.len());
        Ok(Self::new(entries))
    }

    /// Load a registry from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by name.
    ///
    /// Case and whitespace are normalized. The query matches an entry's
    /// canonical or generic name exactly, or its canonical name by substring
    /// in either direction. The first match in registry order wins.
    pub fn find_by_name(&self, name: &str) -> Option<&RegistryEntry> {
        let query = normalize_name(name);
        if query.is_empty() {
            return None;
        }

        self.entries.iter().find(|entry| {
            names_match(
                &query,
                &normalize_name(&entry.name),
                &normalize_name(&entry.generic_name),
            )
        })
    }

    /// Find an entry by exact barcode.
    pub fn find_by_barcode(&self, code: &str) -> Option<&RegistryEntry> {
        self.barcode_index.get(code).map(|&idx| &self.entries[idx])
    }

    /// Compute the trust score (0 - 100) for an entry; absent entries score 0.
    pub fn trust_score(entry: Option<&RegistryEntry>) -> u8 {
        let Some(entry) = entry else {
            return 0;
        };

        let mut score = 0;
        if entry.regulatory_approved {
            score += APPROVAL_POINTS;
        }
        if entry.has_valid_registration() {
            score += REGISTRATION_POINTS;
        }
        score += match entry.authenticity_status {
            AuthenticityStatus::Verified => 30,
            AuthenticityStatus::Unverified => 10,
            AuthenticityStatus::Counterfeit => 0,
        };
        score
    }

    /// Safer alternatives for an entry.
    ///
    /// Empty when the entry is already verified and approved. Otherwise each
    /// alternative name is resolved with [`Registry::find_by_name`]; only
    /// verified, approved entries other than `entry` itself are kept, once each.
    pub fn alternatives(&self, entry: &RegistryEntry) -> Vec<&RegistryEntry> {
        if entry.is_safe() {
            return Vec::new();
        }

        let mut found: Vec<&RegistryEntry> = Vec::new();
        for name in &entry.alternatives {
            let Some(candidate) = self.find_by_name(name) else {
                debug!("Alternative '{}' for {} not in registry", name, entry.name);
                continue;
            };
            if candidate.is_safe()
                && candidate.id != entry.id
                && !found.iter().any(|f| f.id == candidate.id)
            {
                found.push(candidate);
            }
        }
        found
    }

    /// Registry names resembling `query`, most similar first.
    pub fn closest_names(&self, query: &str, limit: usize) -> Vec<String> {
        let query = normalize_name(query);
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &str)> = self
            .entries
            .iter()
            .map(|entry| {
                let by_name = similarity(&query, &normalize_name(&entry.name));
                let by_generic = similarity(&query, &normalize_name(&entry.generic_name));
                (by_name.max(by_generic), entry.name.as_str())
            })
            .filter(|(score, _)| *score >= MIN_SUGGESTION_SIMILARITY)
            .collect();

        // Stable sort keeps registry order among ties
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut names: Vec<String> = Vec::new();
        for (_, name) in scored {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            if names.len() == limit {
                break;
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_entry(
        id: &str,
        name: &str,
        generic: &str,
        status: AuthenticityStatus,
        approved: bool,
    ) -> RegistryEntry {
        let mut entry = RegistryEntry::new(id.into(), name.into(), generic.into(), status);
        entry.regulatory_approved = approved;
        entry.registration_number = format!("DRAP-{}", id);
        entry
    }

    fn setup_registry() -> Registry {
        let mut panadol = make_entry("M1", "Panadol", "Paracetamol", AuthenticityStatus::Verified, true);
        panadol.barcode = Some("8964000000011".into());

        let calpol = make_entry("M2", "Calpol", "Paracetamol", AuthenticityStatus::Verified, true);

        let mut fakeol = make_entry("M3", "Fakeol", "Paracetamol", AuthenticityStatus::Counterfeit, false);
        fakeol.registration_number = "N/A".into();
        fakeol.alternatives = vec!["Panadol".into(), "Calpol".into(), "Brufen".into()];
        fakeol.barcode = Some("8964000000028".into());

        let mut brufen = make_entry("M4", "Brufen", "Ibuprofen", AuthenticityStatus::Unverified, false);
        brufen.registration_number = "DRAP-M4-EXPIRED".into();

        let acme = make_entry("M5", "Acme 500", "Acmeol", AuthenticityStatus::Verified, true);

        Registry::new(vec![panadol, calpol, fakeol, brufen, acme])
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let registry = setup_registry();

        assert_eq!(registry.find_by_name("panadol").unwrap().id, "M1");
        assert_eq!(registry.find_by_name("PANADOL").unwrap().id, "M1");
        assert_eq!(registry.find_by_name("  Panadol  ").unwrap().id, "M1");
    }

    #[test]
    fn test_find_by_name_substring_both_ways() {
        let registry = setup_registry();

        // Query contained in entry name
        assert_eq!(registry.find_by_name("Acme").unwrap().id, "M5");
        // Entry name contained in query
        assert_eq!(registry.find_by_name("Panadol Extra 500mg").unwrap().id, "M1");
    }

    #[test]
    fn test_find_by_generic_name_first_match_wins() {
        let registry = setup_registry();

        // Three entries share the generic name; registry order decides
        assert_eq!(registry.find_by_name("paracetamol").unwrap().id, "M1");
    }

    #[test]
    fn test_find_by_name_misses() {
        let registry = setup_registry();

        assert!(registry.find_by_name("Augmentin").is_none());
        assert!(registry.find_by_name("").is_none());
        assert!(registry.find_by_name("   ").is_none());
        assert!(Registry::default().find_by_name("Panadol").is_none());
    }

    #[test]
    fn test_find_by_barcode_exact() {
        let registry = setup_registry();

        assert_eq!(registry.find_by_barcode("8964000000011").unwrap().id, "M1");
        assert!(registry.find_by_barcode("896400000001").is_none());
        assert!(registry.find_by_barcode(" 8964000000011").is_none());
    }

    #[test]
    fn test_duplicate_barcode_first_wins() {
        let mut a = make_entry("A", "Alpha", "Alphaol", AuthenticityStatus::Verified, true);
        a.barcode = Some("111".into());
        let mut b = make_entry("B", "Beta", "Betaol", AuthenticityStatus::Verified, true);
        b.barcode = Some("111".into());
        let registry = Registry::new(vec![a, b]);

        assert_eq!(registry.find_by_barcode("111").unwrap().id, "A");
    }

    #[test]
    fn test_trust_score() {
        let registry = setup_registry();

        assert_eq!(Registry::trust_score(None), 0);
        assert_eq!(Registry::trust_score(registry.find_by_name("Panadol")), 100);
        assert_eq!(Registry::trust_score(registry.find_by_name("Fakeol")), 0);
        // Unverified, expired registration, not approved
        assert_eq!(Registry::trust_score(registry.find_by_name("Brufen")), 10);
    }

    #[test]
    fn test_trust_score_partial() {
        let mut entry = make_entry("X", "Xanol", "Xanolide", AuthenticityStatus::Unverified, true);
        assert_eq!(Registry::trust_score(Some(&entry)), 80);

        entry.registration_number = "N/A".into();
        assert_eq!(Registry::trust_score(Some(&entry)), 40);
    }

    #[test]
    fn test_alternatives_for_counterfeit() {
        let registry = setup_registry();
        let fakeol = registry.find_by_name("Fakeol").unwrap();

        let ids: Vec<_> = registry
            .alternatives(fakeol)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        // Brufen is unverified and dropped
        assert_eq!(ids, vec!["M1", "M2"]);
    }

    #[test]
    fn test_alternatives_empty_for_safe_entry() {
        let registry = setup_registry();
        let panadol = registry.find_by_name("Panadol").unwrap();
        assert!(registry.alternatives(panadol).is_empty());
    }

    #[test]
    fn test_alternatives_exclude_self_and_duplicates() {
        let mut shady = make_entry("S", "Shadyol", "Paracetamol", AuthenticityStatus::Unverified, true);
        shady.alternatives = vec!["Shadyol".into(), "Panadol".into(), "panadol".into()];
        let panadol = make_entry("P", "Panadol", "Paracetamol", AuthenticityStatus::Verified, true);
        let registry = Registry::new(vec![shady.clone(), panadol]);

        let ids: Vec<_> = registry
            .alternatives(&shady)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["P"]);
    }

    #[test]
    fn test_closest_names() {
        let registry = setup_registry();

        assert_eq!(registry.closest_names("Panadl", 3), vec!["Panadol"]);
        assert!(registry.closest_names("Zzzzzz", 3).is_empty());
        assert!(registry.closest_names("Panadl", 0).is_empty());
    }

    #[test]
    fn test_from_json_wrapped_and_bare() {
        let wrapped = r#"{"medicines":[{"id":"1","name":"Panadol","genericName":"Paracetamol","authenticityStatus":"verified","whoApproved":true,"barcode":"42"}]}"#;
        let registry = Registry::from_json(wrapped).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_barcode("42").unwrap().name, "Panadol");

        let bare = r#"[{"id":"1","name":"Panadol","genericName":"Paracetamol","authenticityStatus":"verified"}]"#;
        assert_eq!(Registry::from_json(bare).unwrap().len(), 1);

        assert!(matches!(
            Registry::from_json("{\"medicines\": 3}"),
            Err(RegistryError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"medicines":[{{"id":"1","name":"Calpol","genericName":"Paracetamol","authenticityStatus":"unverified"}}]}}"#
        )
        .unwrap();

        let registry = Registry::load(file.path()).unwrap();
        assert_eq!(registry.entries()[0].name, "Calpol");

        assert!(matches!(
            Registry::load("/nonexistent/registry.json"),
            Err(RegistryError::Io(_))
        ));
    }
}
