//! Electronic payment slip validation result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{status_is, RawData, ResponseMetadata};

/// Outcome of validating an e-slip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EslipValidationResult {
    pub eslip_number: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligation_period: Option<String>,
    /// Lowercased payment status, e.g. `paid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub validated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub raw_data: RawData,
}

impl EslipValidationResult {
    pub fn is_paid(&self) -> bool {
        self.is_valid && status_is(self.status.as_ref(), "paid")
    }

    pub fn is_pending(&self) -> bool {
        self.is_valid && status_is(self.status.as_ref(), "pending")
    }

    /// Cancelled regardless of validity
    pub fn is_cancelled(&self) -> bool {
        status_is(self.status.as_ref(), "cancelled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_predicates() {
        let mut slip = EslipValidationResult {
            eslip_number: "1234567890".to_string(),
            is_valid: true,
            taxpayer_pin: None,
            taxpayer_name: None,
            amount: Some(1500.0),
            currency: Some("KES".to_string()),
            payment_date: None,
            payment_reference: None,
            obligation_type: None,
            obligation_period: None,
            status: Some("paid".to_string()),
            validated_at: Utc::now(),
            metadata: ResponseMetadata::default(),
            raw_data: RawData::new(),
        };
        assert!(slip.is_paid());
        assert!(!slip.is_pending());

        slip.status = Some("pending".to_string());
        assert!(slip.is_pending());

        slip.is_valid = false;
        slip.status = Some("cancelled".to_string());
        assert!(slip.is_cancelled());
        assert!(!slip.is_paid());
    }
}
