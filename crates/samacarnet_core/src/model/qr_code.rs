//! Patient QR codes.
//!
//! The code is a random token; `payload` is the text a scanner reads.
//! Rendering the image is left to the client.

use super::patient::PatientId;
use super::tenant::TenantId;
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type QrCodeId = i64;

const PAYLOAD_SCHEME: &str = "samacarnet://patients";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    pub id: QrCodeId,
    pub tenant_id: TenantId,
    pub patient_id: PatientId,
    pub code: String,
    pub payload: String,
    pub expires_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl QrCode {
    /// Whether the code may be resolved at `now_ms`.
    pub fn is_usable_at(&self, now_ms: i64) -> bool {
        self.is_active && self.expires_at.map_or(true, |expires_at| now_ms < expires_at)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("code", &self.code)?;
        require_text("payload", &self.payload)
    }
}

/// Builds the scanner payload for a patient number and code.
pub fn build_payload(patient_number: &str, code: &str) -> String {
    format!("{PAYLOAD_SCHEME}/{patient_number}?code={code}")
}

#[cfg(test)]
mod tests {
    use super::{build_payload, QrCode};

    fn code(expires_at: Option<i64>, is_active: bool) -> QrCode {
        QrCode {
            id: 1,
            tenant_id: 1,
            patient_id: 1,
            code: "abc".to_string(),
            payload: build_payload("SC-0001-000001", "abc"),
            expires_at,
            is_active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn payload_embeds_patient_number_and_code() {
        assert_eq!(
            build_payload("SC-0001-000001", "abc"),
            "samacarnet://patients/SC-0001-000001?code=abc"
        );
    }

    #[test]
    fn expired_or_inactive_codes_are_unusable() {
        assert!(code(None, true).is_usable_at(10));
        assert!(code(Some(20), true).is_usable_at(10));
        assert!(!code(Some(10), true).is_usable_at(10));
        assert!(!code(None, false).is_usable_at(10));
    }
}
