// Shared transport configuration for building reqwest::Client instances.
//
// Timeout and retry settings live here so the session manager and the
// request executor agree on them.

use std::time::Duration;

/// Bounded retry settings for the request executor and login loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call (login or request), including the first.
    pub max_attempts: u32,
    /// Pause between attempts. Zero keeps the device's historical
    /// back-to-back behaviour.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Sleep for the configured delay before attempt `attempt` (1-based).
    pub(crate) async fn pause(&self, attempt: u32) {
        if attempt > 1 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("apexctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
