//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use apex_config::ConfigError;
use apex_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(apex::connection_failed),
        help(
            "Check that the controller is powered and reachable on the LAN.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Controller request timed out")]
    #[diagnostic(
        code(apex::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(apex::auth_failed),
        help(
            "Verify the controller login.\n\
             Run: apexctl profile set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(apex::no_credentials),
        help(
            "Store one with: apexctl profile set-password\n\
             Or set the APEX_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(apex::not_found),
        help("Run: apexctl outputs list to see available device ids")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(apex::mismatch),
        help("Run: apexctl config show to inspect the controller's configuration")
    )]
    Mismatch { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(apex::api_error))]
    ApiError { message: String, status: Option<u16> },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("Operation '{operation}' is not supported by this controller")]
    #[diagnostic(
        code(apex::unsupported),
        help("This command requires {required}. Update the controller firmware.")
    )]
    Unsupported { operation: String, required: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(apex::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(apex::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: apexctl profile init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(apex::no_config),
        help(
            "Create a profile with: apexctl profile init\n\
             Or pass --host. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(apex::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(apex::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(apex::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(apex::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::NOT_FOUND
            }
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type.into(),
                identifier,
            },

            err @ (CoreError::ControlTypeMismatch { .. }
            | CoreError::HardwareMismatch { .. }
            | CoreError::ProfileMismatch { .. }) => CliError::Mismatch {
                message: err.to_string(),
            },

            CoreError::InvalidDeviceId { did, reason } => CliError::Validation {
                field: "device id".into(),
                reason: format!("'{did}': {reason}"),
            },

            err @ CoreError::RateOutOfRange { .. } => CliError::Validation {
                field: "rate".into(),
                reason: err.to_string(),
            },

            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },

            CoreError::Api { message, status } => CliError::ApiError { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "configuration".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
