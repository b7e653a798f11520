//! CLI error types with miette diagnostics.
//!
//! Maps config and core failures into user-facing errors with actionable
//! help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use fleetscan_config::ConfigError;
use fleetscan_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Credential documents ─────────────────────────────────────────
    #[error("{what} document not found at {path}")]
    #[diagnostic(
        code(fleetscan::missing_document),
        help(
            "Create it with: fleetscan init\n\
             Or point to an existing file with --{flag}"
        )
    )]
    MissingDocument {
        what: &'static str,
        path: String,
        flag: &'static str,
    },

    #[error("{what} document at {path} is unusable: {reason}")]
    #[diagnostic(
        code(fleetscan::invalid_document),
        help("Re-enter it with: fleetscan init --force")
    )]
    InvalidDocument {
        what: &'static str,
        path: String,
        reason: String,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fleetscan::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(
        code(fleetscan::config),
        help("Check the settings file and FLEETSCAN_* environment variables.")
    )]
    Config(Box<ConfigError>),

    // ── Central ──────────────────────────────────────────────────────
    #[error("Authentication with Central failed: {message}")]
    #[diagnostic(
        code(fleetscan::auth_failed),
        help(
            "The refresh token may have expired.\n\
             Issue a new token pair in Central and run: fleetscan init --force"
        )
    )]
    AuthFailed { message: String },

    #[error("Could not reach Central: {reason}")]
    #[diagnostic(
        code(fleetscan::connection_failed),
        help("Check the base_url in the endpoint document and your network.")
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(fleetscan::timeout),
        help("Increase the timeout with --timeout or [central] timeout.")
    )]
    Timeout { seconds: u64 },

    #[error("{message}")]
    #[diagnostic(code(fleetscan::error))]
    Core { message: String },

    // ── Interactive / IO ─────────────────────────────────────────────
    #[error("Prompt failed: {reason}")]
    #[diagnostic(
        code(fleetscan::prompt),
        help("`fleetscan init` needs an interactive terminal.")
    )]
    Prompt { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Prompt { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::RemoteUnavailable { reason } => Self::ConnectionFailed { reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            other => Self::Core {
                message: other.to_string(),
            },
        }
    }
}

impl From<fleetscan_api::Error> for CliError {
    fn from(err: fleetscan_api::Error) -> Self {
        CoreError::from(err).into()
    }
}
