//! Token retrieval strategies
//!
//! A `TokenRetriever` exchanges one kind of credentials for a bearer token.
//! Retrievers make exactly one request per call and never cache; caching is
//! `Up42Auth`'s job.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::constants::PASSWORD_GRANT_TYPE;
use crate::error::{Error, Result};
use crate::settings::{AccountCredentialsSettings, CredentialKind};

/// Token endpoint response. Only `access_token` is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Obtain a bearer token for one credential kind.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn TokenRetriever>`).
pub trait TokenRetriever: Send + Sync {
    /// Identifier for logging (e.g. "account")
    fn id(&self) -> &str;

    /// Credential kind this retriever serves.
    fn kind(&self) -> CredentialKind;

    /// Fetch a fresh access token from `token_url`, giving up after `timeout`.
    fn retrieve<'a>(
        &'a self,
        client: &'a reqwest::Client,
        token_url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Password-grant retriever for username/password accounts.
pub struct AccountTokenRetriever {
    credentials: AccountCredentialsSettings,
}

impl AccountTokenRetriever {
    pub fn new(credentials: AccountCredentialsSettings) -> Self {
        Self { credentials }
    }
}

impl TokenRetriever for AccountTokenRetriever {
    fn id(&self) -> &str {
        "account"
    }

    fn kind(&self) -> CredentialKind {
        CredentialKind::Account
    }

    fn retrieve<'a>(
        &'a self,
        client: &'a reqwest::Client,
        token_url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(username = %self.credentials.username, token_url, "requesting account token");

            let response = client
                .post(token_url)
                .form(&[
                    ("grant_type", PASSWORD_GRANT_TYPE),
                    ("username", self.credentials.username.as_str()),
                    ("password", self.credentials.password.expose().as_str()),
                ])
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<no body>"));
                warn!(username = %self.credentials.username, %status, "token endpoint rejected credentials");
                return Err(Error::WrongCredentials(format!(
                    "token endpoint returned {status}: {body}"
                )));
            }

            let token = response
                .json::<TokenResponse>()
                .await
                .map_err(|e| Error::TokenResponse(format!("{e}")))?;
            Ok(token.access_token)
        })
    }
}
