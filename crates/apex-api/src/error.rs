use thiserror::Error;

/// Top-level error type for the `apex-api` crate.
///
/// Covers every failure mode of the device protocol: login, transport,
/// HTTP status handling, and payload decoding for both firmware generations.
/// `apex-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed after exhausting the attempt budget.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The device answered 401 to an authenticated request.
    #[error("Unauthorized -- session token rejected by the device")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status that is not worth retrying.
    #[error("HTTP {status} from {path}: {body}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Legacy XML status document could not be decoded.
    #[error("XML decode error: {message}")]
    Xml { message: String },

    /// Request payload could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if the session token was rejected and a fresh
    /// login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Retry policy used by the request executor: re-authenticate on 401,
    /// try again on transient transport failures, stop on everything else.
    pub fn is_retryable(&self) -> bool {
        self.is_auth_expired() || self.is_transient()
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
