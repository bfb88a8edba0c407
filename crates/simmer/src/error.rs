//! CLI error types with miette diagnostics.
//!
//! Maps `simmer_api::Error` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes, stable for scripting.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(simmer::auth_failed),
        help(
            "The cloud rejected your credentials.\n\
             Password login: simmer config set-password\n\
             Captured token: simmer config set-token (tokens expire -- capture a fresh one)"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(simmer::no_credentials),
        help("Configure credentials with: simmer config init")
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(simmer::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: simmer config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(simmer::no_config),
        help(
            "Create one with: simmer config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("No device configured for profile '{profile}'")]
    #[diagnostic(
        code(simmer::no_device),
        help(
            "Discover your appliance with: simmer devices\n\
             Then set device_id in the profile, or pass --device."
        )
    )]
    NoDevice { profile: String },

    // ── Devices ──────────────────────────────────────────────────────

    #[error("Device lookup failed: {message}")]
    #[diagnostic(
        code(simmer::device_lookup),
        help("Check that the appliance is paired to this account in the vendor app.")
    )]
    DeviceLookup { message: String },

    // ── Commands ─────────────────────────────────────────────────────

    #[error("The cloud rejected the command (HTTP {status}): {message}")]
    #[diagnostic(code(simmer::command_rejected))]
    CommandRejected { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(simmer::validation))]
    Validation { field: String, reason: String },

    // ── Transport ────────────────────────────────────────────────────

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(simmer::timeout),
        help(
            "The appliance may still have received the command -- check its state\n\
             with `simmer status` before re-issuing it."
        )
    )]
    Timeout { seconds: u64 },

    #[error("Could not reach the KitchenOS cloud")]
    #[diagnostic(
        code(simmer::connection_failed),
        help("Check your network connection. The vendor cloud may also be down.")
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Interactive / IO ─────────────────────────────────────────────

    #[error("Interactive prompt failed: {reason}")]
    #[diagnostic(code(simmer::prompt))]
    Prompt { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(simmer::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceLookup { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::NoDevice { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── simmer_api::Error → CliError mapping ─────────────────────────────

impl From<simmer_api::Error> for CliError {
    fn from(err: simmer_api::Error) -> Self {
        match err {
            simmer_api::Error::Validation { field, reason } => CliError::Validation {
                field: field.into(),
                reason,
            },

            simmer_api::Error::Authentication { message } => CliError::AuthFailed { message },

            simmer_api::Error::DeviceLookup { message } => CliError::DeviceLookup { message },

            simmer_api::Error::Command { status, message } => {
                CliError::CommandRejected { status, message }
            }

            simmer_api::Error::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            simmer_api::Error::Transport(e) => CliError::ConnectionFailed { source: e.into() },

            simmer_api::Error::InvalidUrl(e) => CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            },

            simmer_api::Error::Deserialization { message, .. } => CliError::CommandRejected {
                status: 0,
                message: format!("unparseable cloud response: {message}"),
            },
        }
    }
}

impl From<simmer_config::ConfigError> for CliError {
    fn from(err: simmer_config::ConfigError) -> Self {
        match err {
            simmer_config::ConfigError::NoCredentials { profile } => {
                CliError::NoCredentials { profile }
            }
            simmer_config::ConfigError::Validation { field, reason } => {
                CliError::Validation { field, reason }
            }
            other => CliError::NoConfig {
                path: format!("{} ({other})", simmer_config::config_path().display()),
            },
        }
    }
}
