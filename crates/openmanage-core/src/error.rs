// ── Core error taxonomy ──
//
// Every failure an operation can hit, classified by what the caller should
// do about it. The `From<openmanage_api::Error>` impl sorts transport-layer
// errors into these buckets; nothing here leaks raw HTTP types.

use serde_json::{Map, Value};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller input ─────────────────────────────────────────────────
    /// Malformed or contradictory input. Never retried.
    #[error("{message}")]
    Configuration { message: String },

    // ── Connection errors ────────────────────────────────────────────
    /// Credentials rejected by the device.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Device unreachable: refused connection, DNS failure, TLS handshake.
    #[error("Unable to communicate with the device: {message}")]
    Connectivity { message: String },

    /// Request sent but no usable response: timeout or reset mid-exchange.
    #[error("Transport failure: {message}")]
    Transport { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The device answered but reported a logical failure.
    ///
    /// `payload` carries the raw diagnostic body for the caller, keyed the
    /// way the result contract expects (`error_info`, `status`, ...).
    #[error("{message}")]
    RemoteOperation {
        message: String,
        payload: Map<String, Value>,
    },

    /// Current state could not be read, so idempotency cannot be judged.
    #[error("Unable to determine the current state: {message}")]
    IndeterminateState { message: String },
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// A remote failure with no payload.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteOperation {
            message: message.into(),
            payload: Map::new(),
        }
    }

    /// A remote failure carrying one payload entry.
    pub fn remote_with(message: impl Into<String>, key: &str, value: Value) -> Self {
        let mut payload = Map::new();
        payload.insert(key.to_owned(), value);
        Self::RemoteOperation {
            message: message.into(),
            payload,
        }
    }

    pub fn indeterminate(message: impl Into<String>) -> Self {
        Self::IndeterminateState {
            message: message.into(),
        }
    }

    /// Returns `true` for failures the orchestrator should treat as
    /// "host unreachable" rather than as a hard task failure.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Connectivity { .. } | Self::Transport { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<openmanage_api::Error> for CoreError {
    fn from(err: openmanage_api::Error) -> Self {
        use openmanage_api::Error as ApiError;

        match err {
            ApiError::Configuration { message } => CoreError::Configuration { message },
            ApiError::InvalidUrl(e) => CoreError::Configuration {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Tls(message) => CoreError::Configuration { message },
            ApiError::Authentication { message } => CoreError::Authentication { message },
            ApiError::SessionCreate { status, message } => CoreError::RemoteOperation {
                message: format!("Unable to create a session (HTTP {status}): {message}"),
                payload: Map::new(),
            },
            ApiError::Transport(ref e) if e.is_connect() => CoreError::Connectivity {
                message: error_chain(e),
            },
            ApiError::Transport(ref e) => CoreError::Transport {
                message: error_chain(e),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Transport {
                message: format!("The request timed out after {timeout_secs}s"),
            },
            // Reusing a closed session is caller misuse, not a device fault.
            ApiError::SessionClosed => CoreError::Configuration {
                message: "The session is already closed".into(),
            },
            ApiError::Deserialization { message, body } => CoreError::remote_with(
                format!("Unable to parse the response: {message}"),
                "error_info",
                Value::String(body),
            ),
        }
    }
}

/// Render an error with its `source()` chain, e.g.
/// `error sending request: tcp connect error: Connection refused`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
