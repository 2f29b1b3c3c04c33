//! UP42 endpoint and token policy constants

/// API host for the global environment
pub const API_HOST_COM: &str = "https://api.up42.com";

/// API host for the China environment
pub const API_HOST_CN: &str = "https://api.up42.cn";

/// Path of the token endpoint, relative to the API host
pub const TOKEN_PATH: &str = "/oauth/token";

/// OAuth grant type for username/password exchange
pub const PASSWORD_GRANT_TYPE: &str = "password";

/// How long a fetched token is reused before it is considered stale
pub const DEFAULT_TOKEN_DURATION_SECS: u64 = 5 * 60;

/// Request timeout for the token endpoint
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 120;
