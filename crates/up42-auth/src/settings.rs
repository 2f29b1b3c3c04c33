//! Typed credential and token provider settings
//!
//! `RawCredentials` is the loosely-typed input (a JSON object from a config
//! file, the environment or a caller). Each recognized credential shape is a
//! `CredentialKind` with a declared set of required fields; detection turns a
//! matching raw map into the corresponding `CredentialsSettings` variant.

use std::fmt;
use std::time::Duration;

use common::Secret;
use serde_json::Value;

use crate::constants::{
    API_HOST_CN, API_HOST_COM, DEFAULT_TOKEN_DURATION_SECS, DEFAULT_TOKEN_TIMEOUT_SECS, TOKEN_PATH,
};
use crate::error::{Error, Result};

/// Loosely-typed credentials as supplied by a caller.
pub type RawCredentials = serde_json::Map<String, Value>;

/// Whether a raw field carries a usable value. `null` and `""` count as absent.
pub(crate) fn is_supplied(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Username/password credentials for the password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountCredentialsSettings {
    pub username: String,
    pub password: Secret<String>,
}

impl AccountCredentialsSettings {
    /// Build account credentials. Both fields must be non-empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        let missing: Vec<&str> = [("username", &username), ("password", &password)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::IncompleteCredentials(format!(
                "empty fields: {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            username,
            password: Secret::new(password),
        })
    }

    /// The raw field map this value was (or could have been) detected from.
    pub fn to_raw(&self) -> RawCredentials {
        let mut raw = RawCredentials::new();
        raw.insert("username".into(), Value::String(self.username.clone()));
        raw.insert(
            "password".into(),
            Value::String(self.password.expose().clone()),
        );
        raw
    }

    fn from_raw(raw: &RawCredentials) -> Result<Self> {
        Self::new(string_field(raw, "username")?, string_field(raw, "password")?)
    }
}

impl fmt::Debug for AccountCredentialsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentialsSettings")
            .field("username", &self.username)
            .field("password", &self.password)
            .finish()
    }
}

impl fmt::Display for AccountCredentialsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AccountCredentialsSettings(username={}, password={})",
            self.username, self.password
        )
    }
}

fn string_field(raw: &RawCredentials, name: &str) -> Result<String> {
    match raw.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::InvalidCredentials(format!(
            "field {name} must be a string, got {other}"
        ))),
        None => Err(Error::IncompleteCredentials(format!("missing field {name}"))),
    }
}

/// A recognized credential shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    Account,
}

impl CredentialKind {
    /// Every known kind, in detection order.
    pub const ALL: &'static [CredentialKind] = &[CredentialKind::Account];

    /// Fields that must all be supplied for this kind to match.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            CredentialKind::Account => &["username", "password"],
        }
    }

    /// Label for logging.
    pub fn label(self) -> &'static str {
        match self {
            CredentialKind::Account => "account",
        }
    }

    /// Build settings of this kind from a raw map that carries exactly the
    /// required fields.
    pub(crate) fn build(self, raw: &RawCredentials) -> Result<CredentialsSettings> {
        match self {
            CredentialKind::Account => Ok(CredentialsSettings::Account(
                AccountCredentialsSettings::from_raw(raw)?,
            )),
        }
    }
}

/// Validated credentials, one variant per `CredentialKind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsSettings {
    Account(AccountCredentialsSettings),
}

impl CredentialsSettings {
    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialsSettings::Account(_) => CredentialKind::Account,
        }
    }
}

impl From<AccountCredentialsSettings> for CredentialsSettings {
    fn from(settings: AccountCredentialsSettings) -> Self {
        CredentialsSettings::Account(settings)
    }
}

impl fmt::Display for CredentialsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsSettings::Account(settings) => fmt::Display::fmt(settings, f),
        }
    }
}

/// Where and how to fetch tokens, and how long to keep them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenProviderSettings {
    pub token_url: String,
    /// A cached token is stale once it is this old
    pub duration: Duration,
    /// Request timeout for the token endpoint
    pub timeout: Duration,
}

impl TokenProviderSettings {
    /// Validate and build token settings.
    ///
    /// `token_url` must be an http(s) URL; `duration` and `timeout` must be
    /// non-zero.
    pub fn new(token_url: impl Into<String>, duration: Duration, timeout: Duration) -> Result<Self> {
        let token_url = token_url.into();
        if !token_url.starts_with("http://") && !token_url.starts_with("https://") {
            return Err(Error::InvalidSettings(format!(
                "token_url must start with http:// or https://, got: {token_url}"
            )));
        }
        if duration.is_zero() {
            return Err(Error::InvalidSettings(
                "duration must be greater than 0".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(Error::InvalidSettings(
                "timeout must be greater than 0".into(),
            ));
        }
        Ok(Self {
            token_url,
            duration,
            timeout,
        })
    }

    /// Token settings for a named UP42 environment (`com` or `cn`) with the
    /// default duration and timeout.
    pub fn for_environment(environment: &str) -> Result<Self> {
        let host = match environment {
            "com" => API_HOST_COM,
            "cn" => API_HOST_CN,
            other => {
                return Err(Error::InvalidSettings(format!(
                    "unknown environment {other:?}, expected \"com\" or \"cn\""
                )));
            }
        };
        Self::new(
            format!("{host}{TOKEN_PATH}"),
            Duration::from_secs(DEFAULT_TOKEN_DURATION_SECS),
            Duration::from_secs(DEFAULT_TOKEN_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_display_redacts_password() {
        let settings = AccountCredentialsSettings::new("some-user", "some-pass").unwrap();
        let display = settings.to_string();
        assert_eq!(
            display,
            "AccountCredentialsSettings(username=some-user, password=[REDACTED])"
        );
        assert!(!format!("{settings:?}").contains("some-pass"));
    }

    #[test]
    fn account_to_raw_has_required_fields() {
        let raw = AccountCredentialsSettings::new("some-user", "some-pass")
            .unwrap()
            .to_raw();
        let mut keys: Vec<&str> = raw.keys().map(String::as_str).collect();
        keys.sort();
        let mut expected = CredentialKind::Account.required_fields().to_vec();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(raw["password"], "some-pass");
    }

    #[test]
    fn account_rejects_empty_fields() {
        let err = AccountCredentialsSettings::new("", "some-pass").unwrap_err();
        assert!(matches!(err, Error::IncompleteCredentials(ref m) if m.contains("username")));

        let err = AccountCredentialsSettings::new("some-user", "").unwrap_err();
        assert!(matches!(err, Error::IncompleteCredentials(ref m) if m.contains("password")));

        let err = AccountCredentialsSettings::new("", "").unwrap_err();
        assert!(
            matches!(err, Error::IncompleteCredentials(ref m) if m.contains("username, password")),
            "got: {err:?}"
        );
    }

    #[test]
    fn build_rejects_non_string_field() {
        let mut raw = RawCredentials::new();
        raw.insert("username".into(), Value::from(42));
        raw.insert("password".into(), Value::from("some-pass"));
        let err = CredentialKind::Account.build(&raw).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)), "got: {err:?}");
    }

    #[test]
    fn empty_string_is_not_supplied() {
        assert!(!is_supplied(&Value::Null));
        assert!(!is_supplied(&Value::from("")));
        assert!(is_supplied(&Value::from("x")));
        assert!(is_supplied(&Value::from(0)));
    }

    #[test]
    fn token_settings_validates_inputs() {
        let ok = TokenProviderSettings::new(
            "https://localhost/oauth/token",
            Duration::from_secs(2),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(ok.duration, Duration::from_secs(2));

        let bad_url = TokenProviderSettings::new(
            "localhost/oauth/token",
            Duration::from_secs(2),
            Duration::from_secs(10),
        );
        assert!(matches!(bad_url, Err(Error::InvalidSettings(_))));

        let zero_duration = TokenProviderSettings::new(
            "https://localhost/oauth/token",
            Duration::ZERO,
            Duration::from_secs(10),
        );
        assert!(matches!(zero_duration, Err(Error::InvalidSettings(_))));

        let zero_timeout = TokenProviderSettings::new(
            "https://localhost/oauth/token",
            Duration::from_secs(2),
            Duration::ZERO,
        );
        assert!(matches!(zero_timeout, Err(Error::InvalidSettings(_))));
    }

    #[test]
    fn environment_selects_host() {
        let com = TokenProviderSettings::for_environment("com").unwrap();
        assert_eq!(com.token_url, "https://api.up42.com/oauth/token");
        assert_eq!(com.duration, Duration::from_secs(300));
        assert_eq!(com.timeout, Duration::from_secs(120));

        let cn = TokenProviderSettings::for_environment("cn").unwrap();
        assert_eq!(cn.token_url, "https://api.up42.cn/oauth/token");

        assert!(TokenProviderSettings::for_environment("eu").is_err());
    }
}
