//! Response envelope metadata

use serde::{Deserialize, Serialize};

/// Envelope fields the API attaches to every response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ResponseMetadata {
    /// Whether the envelope reports an application-level error
    pub fn has_error(&self) -> bool {
        self.error_code.is_some()
    }

    /// Best human-readable description of the envelope
    pub fn message(&self) -> Option<&str> {
        self.error_message.as_deref().or(self.response_desc.as_deref())
    }
}
