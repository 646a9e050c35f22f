//! Request and result models
//!
//! Result models keep the normalized fields the client extracts plus the
//! untouched payload in `raw_data`, so callers can reach fields this crate
//! does not map. Date-relative helpers come in two flavors: a plain one that
//! uses today's UTC date and an `*_on(date)` one for deterministic callers.

pub mod eslip;
pub mod metadata;
pub mod nil_return;
pub mod pin;
pub mod taxpayer;
pub mod tcc;

use chrono::{NaiveDate, Utc};

pub use eslip::EslipValidationResult;
pub use metadata::ResponseMetadata;
pub use nil_return::{NilReturnRequest, NilReturnResult};
pub use pin::PinVerificationResult;
pub use taxpayer::{TaxObligation, TaxpayerDetails};
pub use tcc::{TccVerificationRequest, TccVerificationResult};

use crate::constants::API_DATE_FORMAT;

/// Untouched response payload
pub type RawData = serde_json::Map<String, serde_json::Value>;

/// Parse a `YYYY-MM-DD` date string as returned by the API
pub fn parse_api_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), API_DATE_FORMAT).ok()
}

pub(crate) fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn status_is(status: Option<&String>, expected: &str) -> bool {
    status.is_some_and(|s| s == expected)
}
