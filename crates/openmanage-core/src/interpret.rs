// ── Response interpretation ──
//
// Different API families signal success differently. Each call site names
// the convention it expects with a `SuccessPredicate` instead of inspecting
// the body inline.

use openmanage_api::ResponseEnvelope;
use openmanage_api::lc_jobs::status;
use serde_json::Value;

use crate::error::CoreError;
use crate::result::OperationResult;

/// How a response is judged successful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SuccessPredicate {
    /// `200 <= status < 300`.
    #[default]
    HttpStatus,

    /// 2xx *and* a top-level string field holding one of the accepted values.
    BodyField { field: String, accepted: Vec<String> },

    /// A driver result dictionary whose `Status` is `Success`. HTTP status
    /// is ignored: `Error` and `Found Fault` fail even under a 200.
    DriverResult,
}

impl SuccessPredicate {
    pub fn body_field(field: &str, accepted: &[&str]) -> Self {
        Self::BodyField {
            field: field.to_owned(),
            accepted: accepted.iter().map(|v| (*v).to_owned()).collect(),
        }
    }

    pub fn accepts(&self, envelope: &ResponseEnvelope) -> bool {
        match self {
            Self::HttpStatus => envelope.is_success(),
            Self::BodyField { field, accepted } => {
                envelope.is_success()
                    && envelope
                        .body_str(field)
                        .is_some_and(|v| accepted.iter().any(|a| a == v))
            }
            Self::DriverResult => envelope.body_str("Status") == Some(status::SUCCESS),
        }
    }

    /// Payload key under which a failing body is handed back.
    pub fn failure_payload_key(&self) -> &'static str {
        match self {
            Self::HttpStatus | Self::BodyField { .. } => "error_info",
            Self::DriverResult => "status",
        }
    }

    fn failure_message(&self, envelope: &ResponseEnvelope) -> String {
        match self {
            Self::HttpStatus => envelope.diagnostic(),
            Self::BodyField { field, .. } => {
                if envelope.is_success() {
                    let seen = envelope.body_str(field).unwrap_or("<missing>");
                    envelope
                        .body_str("Message")
                        .map_or_else(|| format!("Unexpected {field} '{seen}'"), str::to_owned)
                } else {
                    envelope.diagnostic()
                }
            }
            Self::DriverResult => envelope
                .body_str("Message")
                .filter(|m| !m.is_empty())
                .map_or_else(
                    || {
                        let seen = envelope.body_str("Status").unwrap_or("<missing>");
                        format!("The operation reported status '{seen}'")
                    },
                    str::to_owned,
                ),
        }
    }
}

/// Fail with [`CoreError::RemoteOperation`] unless `predicate` accepts the
/// envelope. The error carries the most specific diagnostic as its message
/// and the raw body under the predicate's payload key.
pub fn require(envelope: &ResponseEnvelope, predicate: &SuccessPredicate) -> Result<(), CoreError> {
    if predicate.accepts(envelope) {
        return Ok(());
    }
    Err(CoreError::remote_with(
        predicate.failure_message(envelope),
        predicate.failure_payload_key(),
        failure_body(envelope),
    ))
}

/// Map one envelope straight onto the result contract.
///
/// Success yields an unchanged result with the body under `response`;
/// failure yields a failed result as described for [`require`].
pub fn interpret(envelope: &ResponseEnvelope, predicate: &SuccessPredicate) -> OperationResult {
    match require(envelope, predicate) {
        Ok(()) => OperationResult::ok(format!(
            "Request completed with HTTP {} {}.",
            envelope.status_code(),
            envelope.reason()
        ))
        .with_payload("response", envelope.body().clone()),
        Err(err) => OperationResult::from_error(err),
    }
}

fn failure_body(envelope: &ResponseEnvelope) -> Value {
    match envelope.body() {
        Value::Null if !envelope.raw_body().is_empty() => {
            Value::String(envelope.raw_body().to_owned())
        }
        body => body.clone(),
    }
}
