//! PIN verification result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{status_is, RawData, ResponseMetadata};

/// Outcome of verifying a KRA PIN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinVerificationResult {
    pub pin_number: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_name: Option<String>,
    /// Lowercased status, e.g. `active`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Lowercased type, e.g. `individual` or `company`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    pub verified_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub raw_data: RawData,
}

impl PinVerificationResult {
    /// Valid and in `active` status
    pub fn is_active(&self) -> bool {
        self.is_valid && status_is(self.status.as_ref(), "active")
    }

    pub fn is_company(&self) -> bool {
        status_is(self.taxpayer_type.as_ref(), "company")
    }

    pub fn is_individual(&self) -> bool {
        status_is(self.taxpayer_type.as_ref(), "individual")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(is_valid: bool, status: Option<&str>, kind: Option<&str>) -> PinVerificationResult {
        PinVerificationResult {
            pin_number: "P051234567A".to_string(),
            is_valid,
            taxpayer_name: Some("Jane Wanjiku".to_string()),
            status: status.map(str::to_string),
            taxpayer_type: kind.map(str::to_string),
            registration_date: None,
            verified_at: Utc::now(),
            metadata: ResponseMetadata::default(),
            raw_data: RawData::new(),
        }
    }

    #[test]
    fn test_is_active_requires_validity() {
        assert!(result(true, Some("active"), None).is_active());
        assert!(!result(false, Some("active"), None).is_active());
        assert!(!result(true, Some("suspended"), None).is_active());
        assert!(!result(true, None, None).is_active());
    }

    #[test]
    fn test_taxpayer_type_predicates() {
        assert!(result(true, None, Some("company")).is_company());
        assert!(result(true, None, Some("individual")).is_individual());
        assert!(!result(true, None, None).is_company());
    }
}
