//! CLI error types with miette diagnostics.
//!
//! Only errors raised before an operation runs end up here. Once an
//! operation starts, every outcome is reported through the result document.

use miette::Diagnostic;
use thiserror::Error;

use openmanage_config::ConfigError;
use openmanage_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    /// The result document reports `failed = true`.
    pub const FAILED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const IO: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No target device configured")]
    #[diagnostic(
        code(openmanage::no_host),
        help(
            "Pass --hostname, set OPENMANAGE_HOSTNAME, or define a profile in {path}"
        )
    )]
    NoHost { path: String },

    #[error(transparent)]
    #[diagnostic(
        code(openmanage::config),
        help("Check the profile file and OPENMANAGE_* environment variables.")
    )]
    Config(#[from] ConfigError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid options: {message}")]
    #[diagnostic(code(openmanage::validation))]
    Validation { message: String },

    #[error("Unknown module '{name}'")]
    #[diagnostic(code(openmanage::unknown_module), help("Supported modules: {available}"))]
    UnknownModule { name: String, available: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML output: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::UnknownModule { .. } => exit_code::USAGE,
            Self::NoHost { .. } | Self::Config(_) => exit_code::CONFIG,
            Self::Io(_) | Self::Json(_) | Self::Yaml(_) => exit_code::IO,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

/// Only input errors reach the CLI layer before an operation starts; any
/// other core error is reported through the result document instead.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}
