// ── Core error types ──
//
// User-facing errors from apex-core. Consumers never see raw HTTP status
// codes or JSON parse failures: `From<apex_api::Error>` translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Data consistency errors ──────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    #[error("Output {did} has control type '{actual}', expected '{expected}'")]
    ControlTypeMismatch {
        did: String,
        expected: String,
        actual: String,
    },

    #[error("Module {abaddr} is a '{actual}', expected one of [{expected}]")]
    HardwareMismatch {
        abaddr: u32,
        expected: String,
        actual: String,
    },

    #[error("Profile slot {index} holds profile ID {actual}")]
    ProfileMismatch { index: u32, actual: u32 },

    #[error("Invalid device id '{did}': {reason}")]
    InvalidDeviceId { did: String, reason: String },

    // ── Domain range errors ──────────────────────────────────────────
    #[error("Requested rate {requested} mL/min exceeds the supported range (limit {limit} mL/min)")]
    RateOutOfRange { requested: f64, limit: f64 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported {
        operation: String,
        required: String,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    pub(crate) fn legacy_unsupported(operation: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_owned(),
            required: "REST firmware".into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<apex_api::Error> for CoreError {
    fn from(err: apex_api::Error) -> Self {
        match err {
            apex_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            apex_api::Error::Unauthorized => CoreError::AuthenticationFailed {
                message: "session rejected by the controller after re-authentication".into(),
            },
            apex_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            apex_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            apex_api::Error::Http { status: 404, path, .. } => CoreError::NotFound {
                entity_type: "resource",
                identifier: path,
            },
            apex_api::Error::Http { status, path, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status} from {path}")
                } else {
                    format!("HTTP {status} from {path}: {body}")
                },
                status: Some(status),
            },
            apex_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            apex_api::Error::Xml { message } => CoreError::Api {
                message: format!("unexpected XML status: {message}"),
                status: None,
            },
            apex_api::Error::Serialization(e) => CoreError::Api {
                message: format!("could not encode request: {e}"),
                status: None,
            },
        }
    }
}
