use secrecy::SecretString;

/// Username/password pair for the device.
///
/// The same credentials serve both generations: the modern login form and
/// HTTP Basic auth on legacy firmware.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Which API dialect the appliance speaks.
///
/// Determines login behaviour, URL layout, and which payload shapes come
/// back. Detected once per client by the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Generation {
    /// Current REST firmware: `/rest/...` JSON endpoints, `connect.sid` session.
    Modern,
    /// Classic firmware: `/cgi-bin/status.{json,xml}` and form posts, Basic auth.
    Legacy,
}

/// Endpoint paths, relative to the device root.
pub mod paths {
    pub const LOGIN: &str = "rest/login";
    pub const STATUS: &str = "rest/status";
    pub const CONFIG: &str = "rest/config";

    pub const LEGACY_STATUS_JSON: &str = "cgi-bin/status.json";
    pub const LEGACY_STATUS_XML: &str = "cgi-bin/status.xml";
    pub const LEGACY_CONTROL: &str = "cgi-bin/status.cgi";

    /// Name of the session identifier in the login response and cookie.
    pub const SESSION_FIELD: &str = "connect.sid";
}
