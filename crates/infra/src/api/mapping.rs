//! Normalized responses to domain models
//!
//! Field values are read from every spelling the API has been seen to use.
//! Status and type strings are lowercased. Validity comes from an explicit
//! flag when sent, otherwise it is inferred from the status.

use chrono::Utc;
use kra_connect_domain::{
    EslipValidationResult, NilReturnRequest, NilReturnResult, PinVerificationResult, RawData, TaxObligation,
    TaxpayerDetails, TccVerificationResult,
};
use serde_json::Value;

use crate::http::{first_bool, first_f64, first_string, infer_validity_from_status, ApiResponse};

const TAXPAYER_NAME: &[&str] = &["taxpayerName", "TaxpayerName", "taxpayer_name"];
const TAXPAYER_TYPE: &[&str] = &["taxpayerType", "TaxpayerType", "taxpayer_type"];
const PIN_STATUS: &[&str] = &["pinStatus", "status", "TaxpayerStatus"];
const REGISTRATION_DATE: &[&str] = &["registrationDate", "RegistrationDate", "registration_date"];
const IS_VALID: &[&str] = &["isValid", "IsValid"];

fn lowercase(map: &RawData, keys: &[&str]) -> Option<String> {
    first_string(map, keys).map(|s| s.to_lowercase())
}

fn validity(map: &RawData, keys: &[&str], status: Option<&String>) -> bool {
    first_bool(map, keys).unwrap_or_else(|| infer_validity_from_status(status.map(String::as_str)))
}

pub(crate) fn pin_result(pin: &str, response: ApiResponse) -> PinVerificationResult {
    let data = response.data;
    let status = lowercase(&data, PIN_STATUS);

    PinVerificationResult {
        pin_number: first_string(&data, &["kraPin", "KRAPIN", "pin"]).unwrap_or_else(|| pin.to_string()),
        is_valid: validity(&data, IS_VALID, status.as_ref()),
        taxpayer_name: first_string(&data, TAXPAYER_NAME),
        taxpayer_type: lowercase(&data, TAXPAYER_TYPE),
        registration_date: first_string(&data, REGISTRATION_DATE),
        status,
        verified_at: Utc::now(),
        metadata: response.metadata,
        raw_data: data,
    }
}

pub(crate) fn tcc_result(pin: &str, tcc: &str, response: ApiResponse) -> TccVerificationResult {
    let data = response.data;
    let status = lowercase(&data, &["status", "tccStatus"]);

    TccVerificationResult {
        tcc_number: tcc.to_string(),
        is_valid: validity(&data, IS_VALID, status.as_ref()),
        taxpayer_name: first_string(&data, TAXPAYER_NAME),
        pin_number: Some(
            first_string(&data, &["kraPin", "TaxpayerPIN", "pin_number"]).unwrap_or_else(|| pin.to_string()),
        ),
        issue_date: first_string(&data, &["issueDate", "IssueDate"]),
        expiry_date: first_string(&data, &["expiryDate", "ExpiryDate"]),
        is_expired: first_bool(&data, &["isExpired", "IsExpired"]).unwrap_or(false),
        certificate_type: first_string(&data, &["certificateType", "CertificateType"]),
        status,
        verified_at: Utc::now(),
        metadata: response.metadata,
        raw_data: data,
    }
}

pub(crate) fn eslip_result(eslip: &str, response: ApiResponse) -> EslipValidationResult {
    let data = response.data;
    let status = lowercase(&data, &["status", "eslipStatus"]);

    EslipValidationResult {
        eslip_number: first_string(&data, &["EslipNumber", "eslipNumber", "eslip", "eslip_number"])
            .unwrap_or_else(|| eslip.to_string()),
        is_valid: validity(&data, IS_VALID, status.as_ref()),
        taxpayer_pin: first_string(&data, &["taxpayerPin", "TaxpayerPIN", "taxpayer_pin"]),
        taxpayer_name: first_string(&data, TAXPAYER_NAME),
        amount: first_f64(&data, &["amount", "Amount"]),
        currency: first_string(&data, &["currency", "Currency"]),
        payment_date: first_string(&data, &["paymentDate", "PaymentDate"]),
        payment_reference: first_string(
            &data,
            &["paymentReference", "PaymentReference", "referenceNumber", "payment_reference"],
        ),
        obligation_type: first_string(&data, &["obligationType", "taxType", "obligation_type"]),
        obligation_period: first_string(&data, &["obligationPeriod", "taxPeriod", "obligation_period"]),
        status,
        validated_at: Utc::now(),
        metadata: response.metadata,
        raw_data: data,
    }
}

/// `request` must already be validated
pub(crate) fn nil_return_result(request: &NilReturnRequest, response: ApiResponse) -> NilReturnResult {
    let data = response.data;
    let status = lowercase(&data, &["status", "filingStatus"]);

    NilReturnResult {
        success: validity(&data, &["success", "Success"], status.as_ref()),
        pin_number: request.pin_number.clone(),
        obligation_id: request.obligation_code.to_string(),
        period: request.period(),
        reference_number: first_string(&data, &["referenceNumber", "RefNumber"]),
        filing_date: first_string(&data, &["filingDate", "FilingDate"]),
        acknowledgement_number: first_string(&data, &["acknowledgementNumber", "AcknowledgementNumber"]),
        message: first_string(&data, &["message", "responseDesc"]),
        status,
        filed_at: Utc::now(),
        metadata: response.metadata,
        raw_data: data,
    }
}

pub(crate) fn taxpayer_details(pin: &str, profile: ApiResponse, obligations: &ApiResponse) -> TaxpayerDetails {
    let data = profile.data;
    let pick = |keys: &[&str]| first_string(&data, keys);

    TaxpayerDetails {
        pin_number: pin.to_string(),
        taxpayer_name: pick(TAXPAYER_NAME).or_else(|| pick(&["legalName", "BusinessName"])),
        taxpayer_type: lowercase(&data, TAXPAYER_TYPE),
        status: lowercase(&data, PIN_STATUS),
        registration_date: pick(REGISTRATION_DATE),
        business_name: pick(&["businessName", "BusinessName"]),
        trading_name: pick(&["tradingName", "TradingName"]),
        postal_address: pick(&["postalAddress", "PostalAddress"]),
        physical_address: pick(&["physicalAddress", "PhysicalAddress"]),
        email_address: pick(&["emailAddress", "EmailAddress"]),
        phone_number: pick(&["phoneNumber", "PhoneNumber"]),
        obligations: parse_obligations(&obligations.data),
        retrieved_at: Utc::now(),
        metadata: profile.metadata,
        raw_data: data,
    }
}

/// Rows of the `obligations` array; non-object rows are skipped
fn parse_obligations(payload: &RawData) -> Vec<TaxObligation> {
    let Some(rows) = payload.get("obligations").and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(Value::as_object)
        .map(|row| {
            let status = lowercase(row, &["status", "Status"]);
            TaxObligation {
                obligation_id: first_string(row, &["obligationId", "ObligationID", "obligation_id"])
                    .unwrap_or_default(),
                obligation_type: first_string(row, &["obligationType", "ObligationType", "obligation_type"])
                    .unwrap_or_default(),
                description: first_string(row, &["description", "Description"]),
                registration_date: first_string(row, &["registrationDate", "RegistrationDate"]),
                effective_date: first_string(row, &["effectiveDate", "EffectiveDate"]),
                end_date: first_string(row, &["endDate", "EndDate"]),
                frequency: first_string(row, &["frequency", "Frequency"]),
                next_filing_date: first_string(row, &["nextFilingDate", "NextFilingDate"]),
                is_active: validity(row, &["isActive", "IsActive"], status.as_ref()),
                status,
            }
        })
        .collect()
}
