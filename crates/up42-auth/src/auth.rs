//! Bearer token attachment for outgoing requests
//!
//! `Up42Auth` owns the cached token. It starts without one, fetches it on the
//! first signing call, and fetches a new one whenever the cached token has
//! reached the configured duration. The cache lock is held across the whole
//! check-and-refresh region, so callers sharing one instance never trigger
//! more than one refresh per staleness window.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::Mutex;
// Using tokio's clock makes staleness testable with paused time.
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::retriever::TokenRetriever;
use crate::settings::TokenProviderSettings;

/// A fetched access token and the instant it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub created_at: Instant,
}

impl Token {
    /// A token is stale once `now - created_at >= duration`.
    pub fn is_stale(&self, duration: std::time::Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= duration
    }
}

/// Request signer holding a retriever, token settings and the cached token.
pub struct Up42Auth {
    retriever: Arc<dyn TokenRetriever>,
    settings: TokenProviderSettings,
    client: reqwest::Client,
    token: Mutex<Option<Token>>,
}

impl Up42Auth {
    /// Create a signer. No token is fetched until the first request is signed.
    pub fn new(retriever: Arc<dyn TokenRetriever>, settings: TokenProviderSettings) -> Self {
        Self {
            retriever,
            settings,
            client: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    /// Use `client` for token requests instead of a fresh default client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Snapshot of the cached token, if any.
    pub async fn token(&self) -> Option<Token> {
        self.token.lock().await.clone()
    }

    /// Return a valid access token, refreshing the cache if needed.
    ///
    /// Retriever errors are returned unchanged and leave the cache as it was.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_stale(self.settings.duration, Instant::now()) {
                debug!(retriever = self.retriever.id(), "reusing cached token");
                return Ok(token.access_token.clone());
            }
        }

        let access_token = self
            .retriever
            .retrieve(&self.client, &self.settings.token_url, self.settings.timeout)
            .await?;
        info!(
            retriever = self.retriever.id(),
            refreshed = cached.is_some(),
            "fetched access token"
        );
        *cached = Some(Token {
            access_token: access_token.clone(),
            created_at: Instant::now(),
        });
        Ok(access_token)
    }

    /// Set `Authorization: Bearer <token>` on `headers`.
    pub async fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let access_token = self.access_token().await?;
        let mut value = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|e| Error::InvalidToken(format!("not a valid header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Sign a built request and hand it back.
    pub async fn sign(&self, mut request: reqwest::Request) -> Result<reqwest::Request> {
        self.apply(request.headers_mut()).await?;
        Ok(request)
    }
}
