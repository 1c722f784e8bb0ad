// ── Runtime connection configuration ──
//
// Describes *how* to reach one controller: address, credentials, and
// connection tuning. Never touches disk; the CLI builds a
// `ControllerConfig` and hands it in.

use std::time::Duration;

use apex_api::{Credentials, LegacyFormat, RetryPolicy, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Configuration for connecting to a single controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller root URL (e.g., `http://192.168.1.50/`).
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attempt budget and inter-attempt delay for login and requests.
    pub retry: RetryPolicy,
    /// Status document to use on legacy firmware.
    pub legacy_format: LegacyFormat,
}

impl ControllerConfig {
    /// Config with default tuning: 30s timeout, three back-to-back
    /// attempts, automatic legacy format detection.
    pub fn new(url: Url, username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            url,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            legacy_format: LegacyFormat::default(),
        }
    }

    pub(crate) fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            retry: self.retry,
        }
    }
}
