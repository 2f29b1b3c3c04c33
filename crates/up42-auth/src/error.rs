//! Error types for credential detection and token retrieval

/// Errors from credential detection, token retrieval and request signing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("incomplete credentials: {0}")]
    IncompleteCredentials(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("unsupported settings: {0}")]
    UnsupportedSettings(String),

    #[error("wrong credentials: {0}")]
    WrongCredentials(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid token response: {0}")]
    TokenResponse(String),

    #[error("invalid token settings: {0}")]
    InvalidSettings(String),

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("no credentials provided")]
    MissingCredentials,

    #[error("credentials provided by more than one source")]
    MultipleCredentialSources,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
