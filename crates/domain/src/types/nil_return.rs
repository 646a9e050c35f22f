//! NIL return filing

use chrono::{DateTime, Utc};
use kra_connect_common::error::{KraError, KraResult};
use kra_connect_common::validation::validate_pin;
use serde::{Deserialize, Serialize};

use super::{status_is, RawData, ResponseMetadata};
use crate::constants::MIN_FILING_YEAR;

/// NIL return to file for one obligation and month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NilReturnRequest {
    pub pin_number: String,
    pub obligation_code: u32,
    pub month: u32,
    pub year: u32,
}

impl NilReturnRequest {
    pub fn new(pin_number: impl Into<String>, obligation_code: u32, month: u32, year: u32) -> Self {
        Self { pin_number: pin_number.into(), obligation_code, month, year }
    }

    /// Check every field and return a copy with the PIN normalized
    pub fn validated(&self) -> KraResult<Self> {
        let pin_number = validate_pin(&self.pin_number)?;
        if self.obligation_code == 0 {
            return Err(KraError::validation(
                "obligation_code",
                "Obligation code must be positive",
            ));
        }
        if !(1..=12).contains(&self.month) {
            return Err(KraError::validation("month", "Month must be between 1 and 12"));
        }
        if self.year < MIN_FILING_YEAR {
            return Err(KraError::validation("year", "Year must be >= 2000"));
        }
        Ok(Self { pin_number, ..self.clone() })
    }

    /// Filing period as `YYYYMM`
    pub fn period(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

/// Outcome of a NIL return submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NilReturnResult {
    pub success: bool,
    pub pin_number: String,
    pub obligation_id: String,
    /// Filing period as `YYYYMM`
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgement_number: Option<String>,
    /// Lowercased filing status, e.g. `accepted`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub filed_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub raw_data: RawData,
}

impl NilReturnResult {
    pub fn is_accepted(&self) -> bool {
        self.success && status_is(self.status.as_ref(), "accepted")
    }

    pub fn is_pending(&self) -> bool {
        self.success && status_is(self.status.as_ref(), "pending")
    }

    /// Unsuccessful, or explicitly rejected
    pub fn is_rejected(&self) -> bool {
        !self.success || status_is(self.status.as_ref(), "rejected")
    }
}
