use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `fleetscan-api` crate.
///
/// Covers every failure mode of the Central REST surface: token refresh,
/// transport, HTTP status, payload decoding and the on-disk credential
/// documents. `fleetscan-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The call was still unauthorized after one token refresh.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The token endpoint rejected the refresh request.
    #[error("Token refresh failed (HTTP {status}): {message}")]
    RefreshFailed { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A request with a streaming body cannot be replayed after a 401.
    #[error("Request cannot be retried after token refresh")]
    RequestNotRetryable,

    // ── Central API ─────────────────────────────────────────────────
    /// Non-success HTTP status from a Central endpoint.
    #[error("Central API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Credential documents ────────────────────────────────────────
    /// A credential document is missing, unreadable or malformed.
    #[error("Credential document {}: {reason}", path.display())]
    CredentialStore { path: PathBuf, reason: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
