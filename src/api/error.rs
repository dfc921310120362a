use std::fmt;

/// Errors returned by [`ApiClient`](super::ApiClient).
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Bad credentials, no token, or a refresh token the server rejected.
    /// Stored tokens have been cleared; the user must log in again.
    Auth(String),
    /// Non-2xx response once the retry policy is exhausted.
    Api { status: u16, detail: String },
    /// Connection-level failure (refused, DNS, reset).
    Network(String),
    /// The response body was not what we expected.
    Parse(String),
}

impl ApiError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Auth(msg) => write!(f, "{msg}"),
            ApiError::Api { detail, .. } => write!(f, "{detail}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Parse(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Parse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
