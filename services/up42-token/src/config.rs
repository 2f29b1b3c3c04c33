//! Configuration types and loading
//!
//! Config path precedence: `--config` > CONFIG_PATH env var > default file.
//! Credentials may come from the `[credentials]` table or from the
//! UP42_USERNAME / UP42_PASSWORD env vars, but not both. The password can be
//! kept out of the TOML with `password_file`.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use up42_auth::{
    DEFAULT_TOKEN_DURATION_SECS, DEFAULT_TOKEN_TIMEOUT_SECS, RawCredentials, TokenProviderSettings,
};

pub const USERNAME_ENV: &str = "UP42_USERNAME";
pub const PASSWORD_ENV: &str = "UP42_PASSWORD";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Option<CredentialsConfig>,
    #[serde(default)]
    pub token: TokenConfig,
}

/// Loosely-typed credentials, handed to credential detection as-is
#[derive(Deserialize)]
pub struct CredentialsConfig {
    /// File holding the password (alternative to an inline `password`)
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    #[serde(flatten)]
    pub fields: RawCredentials,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields = self.fields.clone();
        if let Some(password) = fields.get_mut("password") {
            if !password.is_null() {
                *password = Value::from("[REDACTED]");
            }
        }
        f.debug_struct("CredentialsConfig")
            .field("password_file", &self.password_file)
            .field("fields", &fields)
            .finish()
    }
}

/// Token endpoint and cache policy
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Overrides the environment's token endpoint
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default = "default_duration")]
    pub duration_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            token_url: None,
            duration_secs: default_duration(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_environment() -> String {
    "com".into()
}

fn default_duration() -> u64 {
    DEFAULT_TOKEN_DURATION_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TOKEN_TIMEOUT_SECS
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        // Fail early on bad token settings
        config.token_settings()?;

        if let Some(credentials) = config.credentials.as_mut() {
            credentials.resolve_password_file()?;
        }

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults (credentials may
    /// come from the environment alone).
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("up42-token.toml")
    }

    /// Token provider settings for the configured environment or URL.
    pub fn token_settings(&self) -> common::Result<TokenProviderSettings> {
        let token_url = match &self.token.token_url {
            Some(url) => url.clone(),
            None => TokenProviderSettings::for_environment(&self.token.environment)
                .map_err(|e| common::Error::Config(e.to_string()))?
                .token_url,
        };
        TokenProviderSettings::new(
            token_url,
            Duration::from_secs(self.token.duration_secs),
            Duration::from_secs(self.token.timeout_secs),
        )
        .map_err(|e| common::Error::Config(e.to_string()))
    }

    /// Credential sources in lookup order: config file, then environment.
    pub fn credential_sources(&self) -> Vec<Option<RawCredentials>> {
        vec![
            self.credentials.as_ref().map(|c| c.fields.clone()),
            env_credentials(),
        ]
    }
}

impl CredentialsConfig {
    fn resolve_password_file(&mut self) -> common::Result<()> {
        let Some(path) = self.password_file.take() else {
            return Ok(());
        };
        if self.fields.contains_key("password") {
            return Err(common::Error::Config(
                "set either password or password_file, not both".into(),
            ));
        }
        let password = std::fs::read_to_string(&path).map_err(|e| {
            common::Error::Config(format!(
                "failed to read password_file {}: {e}",
                path.display()
            ))
        })?;
        self.fields.insert(
            "password".into(),
            Value::String(password.trim().to_owned()),
        );
        Ok(())
    }
}

/// Credentials from UP42_USERNAME / UP42_PASSWORD. `None` when neither is set;
/// an unset one becomes `null` so detection reports it as missing.
fn env_credentials() -> Option<RawCredentials> {
    let username = std::env::var(USERNAME_ENV).ok();
    let password = std::env::var(PASSWORD_ENV).ok();
    if username.is_none() && password.is_none() {
        return None;
    }
    let mut raw = RawCredentials::new();
    raw.insert(
        "username".into(),
        username.map(Value::String).unwrap_or(Value::Null),
    );
    raw.insert(
        "password".into(),
        password.map(Value::String).unwrap_or(Value::Null),
    );
    Some(raw)
}
