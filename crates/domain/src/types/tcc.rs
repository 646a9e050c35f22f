//! Tax compliance certificate verification

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{parse_api_date, status_is, today_utc, RawData, ResponseMetadata};

/// Certificate to verify against a taxpayer PIN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TccVerificationRequest {
    pub kra_pin: String,
    pub tcc_number: String,
}

impl TccVerificationRequest {
    pub fn new(kra_pin: impl Into<String>, tcc_number: impl Into<String>) -> Self {
        Self { kra_pin: kra_pin.into(), tcc_number: tcc_number.into() }
    }
}

/// Outcome of verifying a tax compliance certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TccVerificationResult {
    pub tcc_number: String,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    pub is_expired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_type: Option<String>,
    pub verified_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub raw_data: RawData,
}

impl TccVerificationResult {
    /// Valid, unexpired and in `active` status
    pub fn is_currently_valid(&self) -> bool {
        self.is_valid && !self.is_expired && status_is(self.status.as_ref(), "active")
    }

    /// Parsed expiry date, when present and well formed
    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry_date.as_deref().and_then(parse_api_date)
    }

    /// Whole days from today (UTC) until expiry
    pub fn days_until_expiry(&self) -> i64 {
        self.days_until_expiry_on(today_utc())
    }

    /// Whole days from `today` until expiry; negative once expired, `0` when
    /// the expiry date is absent or unparseable
    pub fn days_until_expiry_on(&self, today: NaiveDate) -> i64 {
        self.expiry().map_or(0, |expiry| (expiry - today).num_days())
    }

    /// Expires within the next `days` days (UTC)
    pub fn is_expiring_soon(&self, days: i64) -> bool {
        self.is_expiring_soon_on(days, today_utc())
    }

    /// Expires between `today` and `today + days`, inclusive
    ///
    /// A certificate without a readable expiry date is never expiring soon.
    pub fn is_expiring_soon_on(&self, days: i64, today: NaiveDate) -> bool {
        self.expiry().is_some_and(|_| (0..=days).contains(&self.days_until_expiry_on(today)))
    }
}
