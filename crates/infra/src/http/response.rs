//! Response envelope normalization
//!
//! GavaConnect endpoints disagree on key spelling and on where the payload
//! lives. Everything here reads a JSON object leniently: the first present,
//! non-blank key wins, and numbers or strings are accepted where the API has
//! been seen to send either.

use kra_connect_domain::{RawData, ResponseMetadata};
use serde_json::Value;

const PAYLOAD_KEYS: [&str; 2] = ["responseData", "data"];

/// Successful, normalized API response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// Operation payload: `responseData`, else `data`, else the whole body
    pub data: RawData,
    /// Envelope codes and messages, whichever casing the server used
    pub metadata: ResponseMetadata,
    /// Untouched body
    pub raw: RawData,
}

impl ApiResponse {
    /// Normalize a decoded response body
    pub fn from_raw(raw: RawData) -> Self {
        let nested_error = raw.get("error").and_then(Value::as_object);
        let metadata = ResponseMetadata {
            response_code: first_string(&raw, &["responseCode", "ResponseCode"]),
            response_desc: first_string(&raw, &["responseDesc", "ResponseDesc", "message", "Message"]),
            status: first_string(&raw, &["status", "Status"]),
            error_code: first_string(&raw, &["ErrorCode", "errorCode", "code"])
                .or_else(|| nested_error.and_then(|err| first_string(err, &["code"]))),
            error_message: first_string(&raw, &["ErrorMessage", "errorMessage"])
                .or_else(|| nested_error.and_then(|err| first_string(err, &["message"]))),
            request_id: first_string(&raw, &["requestId", "RequestId"]),
        };

        let data = PAYLOAD_KEYS
            .iter()
            .find_map(|key| raw.get(*key).and_then(Value::as_object).cloned())
            .unwrap_or_else(|| raw.clone());

        Self { data, metadata, raw }
    }

    /// Whether the body reports an application-level failure
    ///
    /// An error code always fails. Otherwise an explicit `success` flag
    /// decides. A top-level `status` is only an envelope verdict when the
    /// payload is wrapped; in a bare body it is the domain status
    /// (`Active`, `Paid`, ...) and never fails the request.
    pub fn is_failure(&self) -> bool {
        if self.metadata.has_error() {
            return true;
        }
        if let Some(success) = self.raw.get("success").and_then(Value::as_bool) {
            return !success;
        }
        self.is_wrapped()
            && self.metadata.status.as_deref().is_some_and(|status| {
                !status.eq_ignore_ascii_case("ok") && !status.eq_ignore_ascii_case("success")
            })
    }

    /// Whether the payload sits under `responseData` or `data`
    pub fn is_wrapped(&self) -> bool {
        PAYLOAD_KEYS.iter().any(|key| self.raw.get(*key).is_some_and(Value::is_object))
    }

    /// Message describing an application-level failure
    pub fn failure_message(&self) -> &str {
        self.metadata.message().unwrap_or("API request failed")
    }
}

/// Decode a body into a JSON object; an empty body is an empty object
pub fn parse_object(body: &str) -> Option<RawData> {
    if body.trim().is_empty() {
        return Some(RawData::new());
    }
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// `message: details` from an `{"error": {...}}` body, when present
pub fn error_detail(body: &str) -> Option<String> {
    let map = parse_object(body)?;
    let error = map.get("error")?.as_object()?;
    let message = first_string(error, &["message"])?;
    Some(match first_string(error, &["details"]) {
        Some(details) => format!("{message}: {details}"),
        None => message,
    })
}

/// First non-blank string (or number, as text) among `keys`
pub fn first_string(map: &RawData, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First boolean among `keys`; accepts `true/1/yes` and `false/0/no` strings
pub fn first_bool(map: &RawData, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// First number among `keys`; numeric strings are parsed
pub fn first_f64(map: &RawData, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Validity implied by a status string when no explicit flag is sent
pub fn infer_validity_from_status(status: Option<&str>) -> bool {
    let Some(status) = status.map(|s| s.trim().to_ascii_lowercase()) else {
        return false;
    };
    !status.is_empty()
        && !["invalid", "inactive", "expired", "reject"].iter().any(|word| status.contains(word))
}
