use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `simmer-api` crate.
///
/// Covers every failure mode of the cloud client: input validation,
/// authentication, device discovery, command submission, and transport.
/// The CLI maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Input validation ────────────────────────────────────────────
    /// Rejected before any network call was made.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The cloud rejected the credentials, or rejected a token that was
    /// refreshed once already. Retrying with the same credentials
    /// cannot succeed -- the user has to update them.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    // ── Device discovery ────────────────────────────────────────────
    /// The account has no appliances, or the discovery call failed.
    #[error("device lookup failed: {message}")]
    DeviceLookup { message: String },

    // ── Command submission ──────────────────────────────────────────
    /// The cloud rejected a cooking command. Carries the vendor's
    /// status and response body verbatim for diagnosis. Never retried
    /// automatically: the appliance may already have acted on it.
    #[error("cloud rejected command (HTTP {status}): {message}")]
    Command { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// The per-call timeout expired. Not retried automatically because
    /// appliance-side effects may already have occurred.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Map a `reqwest` send error, folding client-side timeouts into
    /// [`Error::Timeout`] so callers see one timeout shape.
    pub(crate) fn from_send(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_secs: timeout.as_secs(),
            }
        } else {
            Self::Transport(err)
        }
    }

    /// Returns `true` if this error indicates the session is no longer
    /// accepted and fresh credentials are required.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the request never produced a usable response
    /// (timeout or transport failure).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
