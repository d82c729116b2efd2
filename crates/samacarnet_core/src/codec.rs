//! JSON column codecs.
//!
//! # Responsibility
//! - Encode structured fields to TEXT columns and decode them back.
//! - Report malformed persisted JSON with the column it came from.
//!
//! # Invariants
//! - Codecs are only invoked at the repository boundary.
//! - `None` optional payloads are stored as SQL `NULL`, never as `"null"`.

use crate::model::patient::{EmergencyContact, Medication};
use crate::model::super_admin::PermissionOverrides;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Codec failure, tagged with the column being processed.
#[derive(Debug)]
pub struct CodecError {
    pub column: &'static str,
    pub source: serde_json::Error,
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid JSON in `{}`: {}", self.column, self.source)
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

fn encode<T: Serialize + ?Sized>(column: &'static str, value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(|source| CodecError { column, source })
}

fn decode<T: DeserializeOwned>(column: &'static str, text: &str) -> CodecResult<T> {
    serde_json::from_str(text).map_err(|source| CodecError { column, source })
}

pub fn encode_allergies(allergies: &[String]) -> CodecResult<String> {
    encode("patients.allergies", allergies)
}

pub fn decode_allergies(text: &str) -> CodecResult<Vec<String>> {
    decode("patients.allergies", text)
}

pub fn encode_medications(medications: &[Medication]) -> CodecResult<String> {
    encode("patients.medications", medications)
}

pub fn decode_medications(text: &str) -> CodecResult<Vec<Medication>> {
    decode("patients.medications", text)
}

pub fn encode_emergency_contact(
    contact: Option<&EmergencyContact>,
) -> CodecResult<Option<String>> {
    contact
        .map(|contact| encode("patients.emergency_contact", contact))
        .transpose()
}

pub fn decode_emergency_contact(text: Option<&str>) -> CodecResult<Option<EmergencyContact>> {
    text.map(|text| decode("patients.emergency_contact", text))
        .transpose()
}

/// Visit-history payloads are opaque and stored exactly as given.
pub fn encode_changes(changes: &Value) -> CodecResult<String> {
    encode("visit_histories.changes", changes)
}

pub fn decode_changes(text: &str) -> CodecResult<Value> {
    decode("visit_histories.changes", text)
}

pub fn encode_permissions_override(
    overrides: Option<&PermissionOverrides>,
) -> CodecResult<Option<String>> {
    overrides
        .map(|overrides| encode("super_admins.permissions_override", overrides))
        .transpose()
}

pub fn decode_permissions_override(
    text: Option<&str>,
) -> CodecResult<Option<PermissionOverrides>> {
    text.map(|text| decode("super_admins.permissions_override", text))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn medications_decode_from_stored_shape() {
        let decoded = decode_medications(
            r#"[{"name":"Metformine","dosage":"500mg","frequency":"2x/jour"}]"#,
        )
        .unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "Metformine");
        assert_eq!(decoded[0].dosage.as_deref(), Some("500mg"));
    }

    #[test]
    fn missing_emergency_contact_stays_null() {
        assert_eq!(encode_emergency_contact(None).unwrap(), None);
        assert_eq!(decode_emergency_contact(None).unwrap(), None);
    }

    #[test]
    fn non_object_changes_are_stored_as_given() {
        let encoded = encode_changes(&json!(["moved", 3])).unwrap();
        assert_eq!(decode_changes(&encoded).unwrap(), json!(["moved", 3]));
    }

    #[test]
    fn malformed_json_names_its_column() {
        let err = decode_allergies("[\"penicillin\"").unwrap_err();
        assert_eq!(err.column, "patients.allergies");
        assert!(err.to_string().contains("patients.allergies"));
    }
}
