// Uniform view of one HTTP exchange.
//
// Status, parsed JSON body and headers, plus parsing of the Redfish/OME
// vendor error structure so callers can pick the most specific
// diagnostic without poking at raw JSON.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::Error;

/// `{"error": {"code", "message", "@Message.ExtendedInfo": [...]}}`
#[derive(Debug, Clone, Deserialize)]
pub struct VendorError {
    pub error: VendorErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "@Message.ExtendedInfo", default)]
    pub extended_info: Vec<ExtendedInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtendedInfo {
    pub message: Option<String>,
    pub message_id: Option<String>,
    pub resolution: Option<String>,
    pub severity: Option<String>,
}

/// Immutable record of a response: status, parsed body, raw headers.
///
/// Returned for every status code the device sends back. Whether a 4xx
/// is a failure or an expected "not found" is the caller's decision.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
    raw_body: String,
}

impl ResponseEnvelope {
    /// Build an envelope from an already-read response.
    ///
    /// An empty body becomes `null`. A body that is not JSON also becomes
    /// `null`, with the text kept in [`raw_body`](Self::raw_body).
    pub fn new(status: StatusCode, headers: HeaderMap, raw_body: String) -> Self {
        let body = if raw_body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw_body).unwrap_or(Value::Null)
        };
        Self {
            status,
            headers,
            body,
            raw_body,
        }
    }

    /// Build an envelope around a body produced locally rather than read
    /// off the wire. Used by drivers that reshape a device response.
    pub fn synthesized(status: StatusCode, body: Value) -> Self {
        let raw_body = if body.is_null() {
            String::new()
        } else {
            body.to_string()
        };
        Self {
            status,
            headers: HeaderMap::new(),
            body,
            raw_body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// `200 <= status < 300`.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase, empty for non-standard codes.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Look up a top-level string field of an object body.
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }

    /// Deserialize the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.body.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: self.raw_body.chars().take(200).collect(),
        })
    }

    /// The vendor error structure, if the body carries one.
    pub fn vendor_error(&self) -> Option<VendorError> {
        self.body
            .get("error")
            .filter(|e| e.is_object())
            .and_then(|_| serde_json::from_value(self.body.clone()).ok())
    }

    /// The most specific human-readable diagnostic available.
    ///
    /// Precedence: first extended-info message, then the vendor error
    /// message, then a top-level `Message`, then `HTTP <code> <reason>`.
    pub fn diagnostic(&self) -> String {
        if let Some(vendor) = self.vendor_error() {
            if let Some(msg) = vendor
                .error
                .extended_info
                .first()
                .and_then(|info| info.message.as_deref())
                .filter(|m| !m.is_empty())
            {
                return msg.to_owned();
            }
            if let Some(msg) = vendor.error.message.filter(|m| !m.is_empty()) {
                return msg;
            }
        }
        if let Some(msg) = self.body_str("Message").filter(|m| !m.is_empty()) {
            return msg.to_owned();
        }
        format!("HTTP {} {}", self.status_code(), self.reason())
            .trim_end()
            .to_owned()
    }
}

/// Drop every `@odata.*` annotation key from an object.
pub fn strip_odata(mut object: Map<String, Value>) -> Map<String, Value> {
    object.retain(|key, _| !key.contains("@odata."));
    object
}
