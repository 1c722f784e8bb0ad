// Session manager
//
// Owns the credentials and the opaque `connect.sid` token, performs login,
// and detects which firmware generation the appliance runs. Detection is
// sticky: once a generation is known it never changes for this session.

use reqwest::StatusCode;
use reqwest::header::{COOKIE, WWW_AUTHENTICATE};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, Generation, paths};
use crate::error::Error;
use crate::transport::RetryPolicy;

/// Authentication state for one appliance.
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    token: Option<SecretString>,
    generation: Option<Generation>,
    /// Set when legacy detection went through the Basic-auth probe.
    /// Legacy requests carry `Authorization: Basic` either way.
    basic_auth: bool,
}

impl Session {
    /// Create an empty session. Nothing is sent until [`authenticate`](Self::authenticate).
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: None,
            generation: None,
            basic_auth: false,
        }
    }

    /// The detected generation, if login has run at least once.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    /// Whether a modern session token is currently held.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Whether legacy requests authenticate with HTTP Basic credentials.
    pub fn uses_basic_auth(&self) -> bool {
        self.basic_auth
    }

    /// Drop the session token so the next request logs in again.
    pub fn invalidate(&mut self) {
        if self.token.take().is_some() {
            debug!("session token invalidated");
        }
    }

    /// Make sure the session can issue requests.
    ///
    /// Returns immediately when a token is held or the device is known to be
    /// legacy. Otherwise posts to `/rest/login` up to `retry.max_attempts`
    /// times:
    /// - 200 with a `connect.sid` field stores the token (modern);
    /// - 404 marks the device legacy;
    /// - 401 triggers a Basic-auth probe of the device root, which marks
    ///   the device legacy when it succeeds;
    /// - anything else is retried until the budget runs out.
    ///
    /// The 404 and 401 signals only count before a generation is known. A
    /// device already seen as modern treats them as failed attempts.
    pub async fn authenticate(
        &mut self,
        http: &reqwest::Client,
        base_url: &Url,
        retry: &RetryPolicy,
    ) -> Result<Generation, Error> {
        if self.generation == Some(Generation::Legacy) {
            return Ok(Generation::Legacy);
        }
        if self.token.is_some() {
            return Ok(Generation::Modern);
        }

        let url = base_url.join(paths::LOGIN)?;
        let body = json!({
            "login": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
            "remember_me": false,
        });

        let mut last_failure = String::from("no login attempt made");
        for attempt in 1..=retry.max_attempts {
            retry.pause(attempt).await;
            debug!(attempt, "logging in at {}", url);

            let resp = match http.post(url.clone()).json(&body).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(attempt, error = %e, "login request failed");
                    last_failure = e.to_string();
                    continue;
                }
            };

            match resp.status() {
                StatusCode::OK => {
                    let text = resp.text().await.map_err(Error::Transport)?;
                    match parse_session_id(&text) {
                        Some(sid) => {
                            debug!("login successful");
                            self.token = Some(SecretString::from(sid));
                            self.generation = Some(Generation::Modern);
                            return Ok(Generation::Modern);
                        }
                        None => {
                            warn!(attempt, "login response carried no session id");
                            last_failure = format!("login response missing {}", paths::SESSION_FIELD);
                        }
                    }
                }
                StatusCode::NOT_FOUND if self.generation.is_none() => {
                    info!("login endpoint absent, treating device as legacy firmware");
                    self.generation = Some(Generation::Legacy);
                    return Ok(Generation::Legacy);
                }
                StatusCode::UNAUTHORIZED => {
                    if self.generation.is_none() && self.probe_basic_auth(http, base_url).await {
                        info!("device accepted Basic credentials, treating as legacy firmware");
                        self.generation = Some(Generation::Legacy);
                        self.basic_auth = true;
                        return Ok(Generation::Legacy);
                    }
                    warn!(attempt, "login rejected (HTTP 401)");
                    last_failure = "credentials rejected (HTTP 401)".into();
                }
                status => {
                    warn!(attempt, %status, "unexpected login status");
                    last_failure = format!("login failed (HTTP {status})");
                }
            }
        }

        Err(Error::Authentication {
            message: format!(
                "{last_failure} after {} attempt(s)",
                retry.max_attempts
            ),
        })
    }

    /// Attach the credential appropriate for the detected generation:
    /// the session cookie on modern firmware, Basic credentials on legacy.
    pub fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.token, self.generation) {
            (Some(token), _) => builder.header(
                COOKIE,
                format!("{}={}", paths::SESSION_FIELD, token.expose_secret()),
            ),
            (None, Some(Generation::Legacy)) => builder.basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            ),
            (None, _) => builder,
        }
    }

    /// Check whether the device root demands Basic auth and accepts ours.
    async fn probe_basic_auth(&self, http: &reqwest::Client, base_url: &Url) -> bool {
        debug!("probing {} for Basic auth", base_url);

        let challenged = match http.get(base_url.clone()).send().await {
            Ok(resp) => {
                resp.status() == StatusCode::UNAUTHORIZED
                    && resp
                        .headers()
                        .get(WWW_AUTHENTICATE)
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("basic"))
            }
            Err(e) => {
                debug!(error = %e, "Basic auth probe failed");
                false
            }
        };
        if !challenged {
            return false;
        }

        http.get(base_url.clone())
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .send()
            .await
            .is_ok_and(|resp| resp.status().is_success())
    }
}

/// Pull the session id out of a login response body.
fn parse_session_id(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get(paths::SESSION_FIELD)?
        .as_str()
        .filter(|sid| !sid.is_empty())
        .map(String::from)
}
