//! Configuration for apexctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `apex_core::ControllerConfig`. The CLI layers its
//! command-line overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use apex_core::{ControllerConfig, LegacyFormat, RetryPolicy};

/// Keyring service name for stored device passwords.
pub const KEYRING_SERVICE: &str = "apexctl";

/// Factory-default login name on Apex controllers.
const DEFAULT_USERNAME: &str = "admin";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: the explicit one, else the default.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Attempts per login or request.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: 0,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    3
}

/// A named controller profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Controller address: a host name, an IP, or a full URL.
    pub host: String,

    /// Login name (defaults to `admin`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (plaintext -- prefer the keyring or an env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Override request timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override attempts per call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Override pause between attempts (milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    /// Legacy status document: `auto`, `json`, or `xml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_format: Option<LegacyFormat>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "apexctl", "apexctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("apexctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` layered over defaults, then `APEX_*`
/// environment variables (`__` separates nesting, e.g.
/// `APEX_DEFAULTS__TIMEOUT`). A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("APEX_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Resolve the login name: profile, then `APEX_USERNAME`, then `admin`.
pub fn resolve_username(profile: &Profile) -> String {
    profile
        .username
        .clone()
        .or_else(|| std::env::var("APEX_USERNAME").ok())
        .unwrap_or_else(|| DEFAULT_USERNAME.into())
}

/// Resolve the password from the credential chain.
///
/// Order: the profile's `password_env` variable, `APEX_PASSWORD`, the
/// system keyring, plaintext in the profile.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var("APEX_PASSWORD") {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    debug!(profile = profile_name, "password stored in keyring");
    Ok(())
}

/// Parse a profile `host` into a device root URL. Bare hosts get
/// `http://`; the controller serves plain HTTP on the LAN.
pub fn parse_host(host: &str) -> Result<Url, ConfigError> {
    let trimmed = host.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ConfigError::Validation {
        field: "host".into(),
        reason: format!("'{host}': {e}"),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("'{host}' has no host name"),
        });
    }
    Ok(url)
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = parse_host(&profile.host)?;
    let password = resolve_password(profile, profile_name)?;

    let retries = profile.retries.unwrap_or(defaults.retries);
    if retries == 0 {
        return Err(ConfigError::Validation {
            field: "retries".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut config = ControllerConfig::new(url, resolve_username(profile), password);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.retry = RetryPolicy {
        max_attempts: retries,
        delay: Duration::from_millis(profile.retry_delay_ms.unwrap_or(defaults.retry_delay_ms)),
    };
    config.legacy_format = profile.legacy_format.unwrap_or_default();
    Ok(config)
}
