//! Registry reference models.

use serde::{Deserialize, Serialize};

/// Registration-number sentinel meaning "no registration on file".
pub const REGISTRATION_NOT_AVAILABLE: &str = "N/A";

/// Authenticity status assigned to a registry entry by the regulator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticityStatus {
    Verified,
    Unverified,
    Counterfeit,
}

/// A single medicine in the reference drug registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Registry identifier
    pub id: String,
    /// Canonical (brand) name
    pub name: String,
    /// Generic/active-ingredient name
    pub generic_name: String,
    /// Available strengths (e.g., ["250mg", "500mg"])
    #[serde(default)]
    pub strength: Vec<String>,
    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: String,
    /// Regulatory registration number ("N/A" when absent)
    #[serde(default)]
    pub registration_number: String,
    /// Therapeutic category (e.g., "Antibiotic")
    #[serde(default)]
    pub category: String,
    /// Authenticity status
    pub authenticity_status: AuthenticityStatus,
    /// Whether the medicine carries regulatory (WHO) approval.
    ///
    /// Also read from `whoApproved`; a record carrying both keys is
    /// rejected as a duplicate field.
    #[serde(alias = "whoApproved", default)]
    pub regulatory_approved: bool,
    /// Known side effects
    #[serde(default)]
    pub side_effects: Vec<String>,
    /// Names of alternative medicines (resolved by name at lookup time)
    #[serde(default)]
    pub alternatives: Vec<String>,
    /// Package barcode, if registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl RegistryEntry {
    /// Create a new entry with required fields.
    pub fn new(id: String, name: String, generic_name: String, status: AuthenticityStatus) -> Self {
        Self {
            id,
            name,
            generic_name,
            strength: Vec::new(),
            manufacturer: String::new(),
            registration_number: REGISTRATION_NOT_AVAILABLE.to_string(),
            category: String::new(),
            authenticity_status: status,
            regulatory_approved: false,
            side_effects: Vec::new(),
            alternatives: Vec::new(),
            barcode: None,
        }
    }

    /// Check if the registration number is present, not "N/A", and not expired.
    pub fn has_valid_registration(&self) -> bool {
        let number = self.registration_number.trim();
        !number.is_empty()
            && number != REGISTRATION_NOT_AVAILABLE
            && !number.to_uppercase().contains("EXPIRED")
    }

    pub fn is_verified(&self) -> bool {
        self.authenticity_status == AuthenticityStatus::Verified
    }

    pub fn is_unverified(&self) -> bool {
        self.authenticity_status == AuthenticityStatus::Unverified
    }

    pub fn is_counterfeit(&self) -> bool {
        self.authenticity_status == AuthenticityStatus::Counterfeit
    }

    /// Verified and regulator-approved: the only entries offered as alternatives.
    pub fn is_safe(&self) -> bool {
        self.is_verified() && self.regulatory_approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RegistryEntry {
        RegistryEntry::new(
            "MED001".into(),
            "Panadol".into(),
            "Paracetamol".into(),
            AuthenticityStatus::Verified,
        )
    }

    #[test]
    fn test_registration_validity() {
        let mut item = entry();
        assert!(!item.has_valid_registration());

        item.registration_number = "DRAP-012345".into();
        assert!(item.has_valid_registration());

        item.registration_number = "DRAP-012345-EXPIRED".into();
        assert!(!item.has_valid_registration());

        item.registration_number = "expired 2021".into();
        assert!(!item.has_valid_registration());

        item.registration_number = "  ".into();
        assert!(!item.has_valid_registration());
    }

    #[test]
    fn test_is_safe() {
        let mut item = entry();
        assert!(!item.is_safe());

        item.regulatory_approved = true;
        assert!(item.is_safe());

        item.authenticity_status = AuthenticityStatus::Unverified;
        assert!(!item.is_safe());
        assert!(item.is_unverified());

        item.authenticity_status = AuthenticityStatus::Counterfeit;
        assert!(!item.is_unverified());
    }

    #[test]
    fn test_deserialize_registry_json() {
        let json = r#"{
            "id": "MED007",
            "name": "Augmentin",
            "genericName": "Amoxicillin Clavulanate",
            "strength": ["375mg", "625mg"],
            "manufacturer": "GSK",
            "registrationNumber": "DRAP-004512",
            "category": "Antibiotic",
            "authenticityStatus": "verified",
            "whoApproved": true,
            "sideEffects": ["Nausea"],
            "alternatives": ["Amoxil"],
            "barcode": "8964000100017"
        }"#;

        let item: RegistryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(item.generic_name, "Amoxicillin Clavulanate");
        assert_eq!(item.authenticity_status, AuthenticityStatus::Verified);
        assert!(item.regulatory_approved);
        assert_eq!(item.barcode.as_deref(), Some("8964000100017"));
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let json = r#"{"id":"X","name":"Fakeol","genericName":"Unknown","authenticityStatus":"counterfeit"}"#;
        let item: RegistryEntry = serde_json::from_str(json).unwrap();

        assert!(item.is_counterfeit());
        assert!(!item.regulatory_approved);
        assert!(item.alternatives.is_empty());
        assert_eq!(item.barcode, None);
    }

    #[test]
    fn test_approval_key_and_alias_conflict() {
        let json = r#"{"id":"X","name":"Panadol","genericName":"Paracetamol","authenticityStatus":"verified","regulatoryApproved":true,"whoApproved":true}"#;
        let err = serde_json::from_str::<RegistryEntry>(json).unwrap_err();

        assert!(err.to_string().contains("duplicate field"));
    }
}
