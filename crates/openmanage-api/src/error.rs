use thiserror::Error;

/// Top-level error type for the `openmanage-api` crate.
///
/// Covers every failure mode of the session transport: endpoint and
/// credential shape, TLS setup, login, the HTTP exchange itself, and body
/// decoding. Remote-side error statuses are *not* errors at this layer;
/// they come back as a [`ResponseEnvelope`](crate::ResponseEnvelope).
/// `openmanage-core` maps these into its user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Endpoint or credential fields are missing or contradictory.
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CA bundle could not be read or parsed, or the client could not be built.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// Session creation was rejected by the device.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session creation failed for a reason other than rejected credentials.
    #[error("Unable to create a session (HTTP {status}): {message}")]
    SessionCreate { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, reset, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The session was already closed when a request was issued.
    #[error("Session is closed")]
    SessionClosed,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with a preview of the raw body.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the device could not be reached at all:
    /// connection refused, DNS failure, or a failed TLS handshake.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the request was sent but no complete response arrived.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the error stems from caller input rather than the device.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::InvalidUrl(_) | Self::Tls(_)
        )
    }
}
