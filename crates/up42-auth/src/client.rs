//! Signed HTTP client built from one of several credential sources
//!
//! Callers usually have more than one place credentials may come from (a
//! config file, the environment, explicit arguments). Exactly one of them may
//! supply credentials; the resulting settings drive retriever detection and
//! an `Up42Auth` that signs every request the client sends.

use std::sync::Arc;

use tracing::debug;

use crate::auth::Up42Auth;
use crate::detect::{detect_retriever, detect_settings};
use crate::error::{Error, Result};
use crate::settings::{CredentialsSettings, RawCredentials, TokenProviderSettings};

/// Detect settings in every source and return the single one that supplied
/// credentials.
///
/// Detection errors in any source are returned as-is. Two or more sources with
/// credentials is `MultipleCredentialSources`; none is `MissingCredentials`.
pub fn select_settings(sources: &[Option<RawCredentials>]) -> Result<CredentialsSettings> {
    let mut selected = None;
    for (index, source) in sources.iter().enumerate() {
        let Some(settings) = detect_settings(source.as_ref())? else {
            continue;
        };
        if selected.is_some() {
            return Err(Error::MultipleCredentialSources);
        }
        debug!(source = index, kind = settings.kind().label(), "credentials source selected");
        selected = Some(settings);
    }
    selected.ok_or(Error::MissingCredentials)
}

/// HTTP client that signs every request with a cached UP42 token.
#[derive(Clone)]
pub struct Client {
    auth: Arc<Up42Auth>,
    http: reqwest::Client,
}

impl Client {
    /// Resolve credentials from `sources` and build a signing client.
    ///
    /// No token is fetched until the first request.
    pub fn create(
        sources: &[Option<RawCredentials>],
        token_settings: TokenProviderSettings,
    ) -> Result<Self> {
        let settings = select_settings(sources)?;
        let retriever = detect_retriever(&settings)?;
        let http = reqwest::Client::new();
        let auth = Up42Auth::new(retriever, token_settings).with_client(http.clone());
        Ok(Self {
            auth: Arc::new(auth),
            http,
        })
    }

    pub fn auth(&self) -> &Up42Auth {
        &self.auth
    }

    /// Start a request; send it with [`Client::send`].
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http.request(method, url)
    }

    /// Build, sign and execute a request.
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = builder
            .build()
            .map_err(|e| Error::Http(format!("invalid request: {e}")))?;
        let request = self.auth.sign(request).await?;
        self.http
            .execute(request)
            .await
            .map_err(|e| Error::Http(format!("request failed: {e}")))
    }
}
