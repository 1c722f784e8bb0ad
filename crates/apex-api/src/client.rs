// Apex HTTP client
//
// Wraps `reqwest::Client` with the device's session handling and the single
// bounded retry loop every call goes through. Endpoint modules (`rest`,
// `legacy`) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{Credentials, Generation};
use crate::error::Error;
use crate::session::Session;
use crate::transport::{RetryPolicy, TransportConfig};

/// Request body for a write.
#[derive(Debug, Clone)]
pub(crate) enum Body {
    /// `PUT` with a JSON document (modern config/status writes).
    Json(serde_json::Value),
    /// `POST` with `application/x-www-form-urlencoded` pairs (legacy CGI).
    Form(Vec<(String, String)>),
}

/// Raw HTTP client for one appliance.
///
/// Owns the [`Session`]; every request first makes sure the session is
/// authenticated, then retries according to the [`RetryPolicy`]. Methods
/// take `&mut self`: one client serves one caller at a time.
pub struct ApexClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
    retry: RetryPolicy,
}

impl ApexClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the device root, e.g. `http://192.168.1.50/`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials, transport.retry))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Credentials,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: normalize_base(base_url),
            session: Session::new(credentials),
            retry,
        }
    }

    /// The session state (token presence, detected generation).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The detected generation, if authentication has run.
    pub fn generation(&self) -> Option<Generation> {
        self.session.generation()
    }

    /// Run the session manager. Cheap when already authenticated.
    pub async fn authenticate(&mut self) -> Result<Generation, Error> {
        self.session
            .authenticate(&self.http, &self.base_url, &self.retry)
            .await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a device-relative path.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `GET` a path and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&mut self, path: &str) -> Result<T, Error> {
        let body = self.execute(path, None).await?;
        decode_json(&body)
    }

    /// `GET` a path and return the body as text.
    pub(crate) async fn get_text(&mut self, path: &str) -> Result<String, Error> {
        self.execute(path, None).await
    }

    /// `PUT` a JSON document and decode the JSON reply.
    pub(crate) async fn put_json<T: DeserializeOwned>(
        &mut self,
        path: &str,
        payload: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let value = serde_json::to_value(payload)?;
        let body = self.execute(path, Some(Body::Json(value))).await?;
        if body.trim().is_empty() {
            return decode_json("null");
        }
        decode_json(&body)
    }

    /// `POST` form pairs and return the raw reply.
    pub(crate) async fn post_form(
        &mut self,
        path: &str,
        pairs: Vec<(String, String)>,
    ) -> Result<String, Error> {
        self.execute(path, Some(Body::Form(pairs))).await
    }

    /// The resilient request executor.
    ///
    /// Authenticates before every attempt (a failed login fails the call
    /// without touching `path`), then sends the request:
    /// - success status: the body is returned;
    /// - 401: the token is dropped and the loop retries, forcing a new login;
    /// - timeout/connect failure: retried;
    /// - any other status: the loop stops with [`Error::Http`].
    ///
    /// Reads carry a `_=<unix time>` cache-buster; writes do not.
    pub(crate) async fn execute(&mut self, path: &str, body: Option<Body>) -> Result<String, Error> {
        let url = self.url(path)?;
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts {
            self.retry.pause(attempt).await;
            self.authenticate().await?;

            match self.send_once(&url, path, body.as_ref()).await {
                Ok(text) => return Ok(text),
                Err(Error::Unauthorized) => {
                    warn!(attempt, path, "request unauthorized, re-authenticating");
                    self.session.invalidate();
                    last_error = Some(Error::Unauthorized);
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, path, error = %e, "transient request failure");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(Error::Authentication {
            message: "retry budget is zero".into(),
        }))
    }

    async fn send_once(&self, url: &Url, path: &str, body: Option<&Body>) -> Result<String, Error> {
        let builder = match body {
            None => {
                let mut url = url.clone();
                url.query_pairs_mut()
                    .append_pair("_", &cache_buster().to_string());
                debug!("GET {}", url);
                self.http.get(url)
            }
            Some(Body::Json(value)) => {
                debug!("PUT {}", url);
                self.http.put(url.clone()).json(value)
            }
            Some(Body::Form(pairs)) => {
                debug!("POST {}", url);
                self.http.post(url.clone()).form(pairs)
            }
        };

        let resp = self
            .session
            .apply(builder)
            .send()
            .await
            .map_err(Error::Transport)?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        let text = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                path: path.to_owned(),
                body: preview(&text).to_owned(),
            });
        }

        trace!(path, bytes = text.len(), "response received");
        Ok(text)
    }
}

/// Ensure the base URL ends with `/` so relative joins keep any path prefix.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn cache_buster() -> i64 {
    chrono::Utc::now().timestamp()
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base(Url::parse("http://10.0.0.5/apex").unwrap());
        assert_eq!(url.as_str(), "http://10.0.0.5/apex/");
        assert_eq!(url.join("rest/status").unwrap().as_str(), "http://10.0.0.5/apex/rest/status");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
