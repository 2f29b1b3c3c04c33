//! UP42 token authentication library
//!
//! Turns loosely-typed credentials into a cached bearer token attached to
//! outgoing requests. The crate has no dependency on the CLI binary and can be
//! used and tested on its own.
//!
//! Flow:
//! 1. Raw credentials go through `detect::detect_settings()`
//! 2. The resolved settings select a retriever via `detect::detect_retriever()`
//! 3. `auth::Up42Auth` holds the retriever and `TokenProviderSettings`
//! 4. Each `Up42Auth::apply()` reuses the cached token or fetches a new one,
//!    then stamps `Authorization: Bearer <token>`
//!
//! `client::Client` bundles these steps for callers with several credential
//! sources.

pub mod auth;
pub mod client;
pub mod constants;
pub mod detect;
pub mod error;
pub mod retriever;
pub mod settings;

pub use auth::{Token, Up42Auth};
pub use client::{Client, select_settings};
pub use constants::*;
pub use detect::{RetrieverRegistry, detect_retriever, detect_settings};
pub use error::{Error, Result};
pub use retriever::{AccountTokenRetriever, TokenRetriever};
pub use settings::{
    AccountCredentialsSettings, CredentialKind, CredentialsSettings, RawCredentials,
    TokenProviderSettings,
};
