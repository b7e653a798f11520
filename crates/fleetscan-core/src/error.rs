// ── Core error types ──
//
// Domain errors for the remediation engine. Scan cycles never see HTTP
// status codes or JSON failures directly; `From<fleetscan_api::Error>`
// folds transport-layer errors into the categories the engines report.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Startup ──────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Central unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("Central request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Central API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Invalid serial: {input:?}")]
    Validation { input: String },

    #[error("Device Type {kind} not supported. Aborting")]
    UnsupportedDeviceKind { serial: String, kind: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short label shown to the operator when a cycle fails.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "Auth Error",
            Self::RemoteUnavailable { .. } | Self::Timeout { .. } => "Central Unreachable",
            Self::Validation { .. } => "Serial?",
            Self::UnsupportedDeviceKind { .. } => "Not supported",
            Self::Config { .. } | Self::Api { .. } | Self::Internal(_) => "Error",
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetscan_api::Error> for CoreError {
    fn from(err: fleetscan_api::Error) -> Self {
        use fleetscan_api::Error as Api;

        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::RefreshFailed { status, message } => CoreError::AuthenticationFailed {
                message: format!("token refresh rejected (HTTP {status}): {message}"),
            },
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() || e.is_request() {
                    CoreError::RemoteUnavailable {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Tls(reason) => CoreError::RemoteUnavailable {
                reason: format!("TLS error: {reason}"),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::CredentialStore { path, reason } => CoreError::Config {
                message: format!("{}: {reason}", path.display()),
            },
            Api::RequestNotRetryable => {
                CoreError::Internal("request body cannot be replayed".into())
            }
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response shape: {message}"),
                status: None,
            },
        }
    }
}
