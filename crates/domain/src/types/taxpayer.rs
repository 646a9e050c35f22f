//! Taxpayer profile and registered obligations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{parse_api_date, status_is, today_utc, RawData, ResponseMetadata};

/* -------------------------------------------------------------------------- */
/* Taxpayer Details */
/* -------------------------------------------------------------------------- */

/// Taxpayer profile assembled from the PIN and obligation lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerDetails {
    pub pin_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxpayer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trading_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub obligations: Vec<TaxObligation>,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: ResponseMetadata,
    #[serde(default)]
    pub raw_data: RawData,
}

impl TaxpayerDetails {
    pub fn is_active(&self) -> bool {
        status_is(self.status.as_ref(), "active")
    }

    pub fn is_company(&self) -> bool {
        status_is(self.taxpayer_type.as_ref(), "company")
    }

    pub fn is_individual(&self) -> bool {
        status_is(self.taxpayer_type.as_ref(), "individual")
    }

    /// Business name, else trading name, else registered taxpayer name
    pub fn display_name(&self) -> &str {
        self.business_name
            .as_deref()
            .or(self.trading_name.as_deref())
            .or(self.taxpayer_name.as_deref())
            .unwrap_or_default()
    }

    /// Whether any registered obligation has type `obligation_type`
    pub fn has_obligation(&self, obligation_type: &str) -> bool {
        self.obligations.iter().any(|ob| ob.obligation_type == obligation_type)
    }

    /// Obligations currently flagged active
    pub fn active_obligations(&self) -> impl Iterator<Item = &TaxObligation> {
        self.obligations.iter().filter(|ob| ob.is_active)
    }
}

/* -------------------------------------------------------------------------- */
/* Tax Obligations */
/* -------------------------------------------------------------------------- */

/// One tax obligation a taxpayer is registered for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxObligation {
    pub obligation_id: String,
    pub obligation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_filing_date: Option<String>,
    pub is_active: bool,
}

impl TaxObligation {
    fn next_filing(&self) -> Option<NaiveDate> {
        if !self.is_active {
            return None;
        }
        self.next_filing_date.as_deref().and_then(parse_api_date)
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended_on(today_utc())
    }

    /// End date is readable and strictly before `today`
    pub fn has_ended_on(&self, today: NaiveDate) -> bool {
        self.end_date.as_deref().and_then(parse_api_date).is_some_and(|end| today > end)
    }

    pub fn is_filing_due_soon(&self, days: i64) -> bool {
        self.is_filing_due_soon_on(days, today_utc())
    }

    /// Active with the next filing between `today` and `today + days`
    pub fn is_filing_due_soon_on(&self, days: i64, today: NaiveDate) -> bool {
        self.next_filing().is_some_and(|due| (0..=days).contains(&(due - today).num_days()))
    }

    pub fn is_filing_overdue(&self) -> bool {
        self.is_filing_overdue_on(today_utc())
    }

    /// Active with the next filing date already passed
    pub fn is_filing_overdue_on(&self, today: NaiveDate) -> bool {
        self.next_filing().is_some_and(|due| today > due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn obligation(kind: &str, next_filing: Option<&str>, is_active: bool) -> TaxObligation {
        TaxObligation {
            obligation_id: "OBL-1".to_string(),
            obligation_type: kind.to_string(),
            next_filing_date: next_filing.map(str::to_string),
            is_active,
            ..TaxObligation::default()
        }
    }

    fn details() -> TaxpayerDetails {
        TaxpayerDetails {
            pin_number: "P051234567A".to_string(),
            taxpayer_name: Some("Jane Wanjiku".to_string()),
            taxpayer_type: Some("company".to_string()),
            status: Some("active".to_string()),
            registration_date: None,
            business_name: None,
            trading_name: None,
            postal_address: None,
            physical_address: None,
            email_address: None,
            phone_number: None,
            obligations: vec![obligation("VAT", None, true), obligation("PAYE", None, false)],
            retrieved_at: Utc::now(),
            metadata: ResponseMetadata::default(),
            raw_data: RawData::new(),
        }
    }

    /// Validates `TaxpayerDetails::display_name` behavior for the fallback
    /// order scenario.
    ///
    /// Assertions:
    /// - Confirms business name wins over trading name and taxpayer name.
    /// - Confirms trading name wins over taxpayer name.
    #[test]
    fn test_display_name_fallback() {
        let mut profile = details();
        assert_eq!(profile.display_name(), "Jane Wanjiku");

        profile.trading_name = Some("Wanjiku Traders".to_string());
        assert_eq!(profile.display_name(), "Wanjiku Traders");

        profile.business_name = Some("Wanjiku Holdings Ltd".to_string());
        assert_eq!(profile.display_name(), "Wanjiku Holdings Ltd");
    }

    #[test]
    fn test_obligation_lookup() {
        let profile = details();
        assert!(profile.has_obligation("VAT"));
        assert!(profile.has_obligation("PAYE"));
        assert!(!profile.has_obligation("ITAX"));
        assert_eq!(profile.active_obligations().count(), 1);
        assert!(profile.is_active());
        assert!(profile.is_company());
    }

    /// Validates `TaxObligation` filing helpers for the due-date scenario.
    ///
    /// Assertions:
    /// - Confirms due-soon and overdue windows relative to a fixed date.
    /// - Ensures inactive obligations are never due or overdue.
    #[test]
    fn test_filing_windows() {
        let today = date(2024, 3, 10);

        let due = obligation("VAT", Some("2024-03-20"), true);
        assert!(due.is_filing_due_soon_on(10, today));
        assert!(!due.is_filing_due_soon_on(5, today));
        assert!(!due.is_filing_overdue_on(today));

        let late = obligation("VAT", Some("2024-03-01"), true);
        assert!(late.is_filing_overdue_on(today));
        assert!(!late.is_filing_due_soon_on(30, today));

        let inactive = obligation("VAT", Some("2024-03-01"), false);
        assert!(!inactive.is_filing_overdue_on(today));
        assert!(!inactive.is_filing_due_soon_on(30, today));
    }

    #[test]
    fn test_has_ended() {
        let today = date(2024, 3, 10);
        let mut ob = obligation("TOT", None, true);
        assert!(!ob.has_ended_on(today));

        ob.end_date = Some("2024-03-09".to_string());
        assert!(ob.has_ended_on(today));

        ob.end_date = Some("2024-03-10".to_string());
        assert!(!ob.has_ended_on(today));
    }
}
