//! Crate-wide error hierarchy for git-platform.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Maximum number of characters kept from an upstream error body.
const SNIPPET_LIMIT: usize = 512;

/// Root error type for every call made against the code-hosting platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Non-success HTTP status (anything except 200/201 unless special-cased).
    #[error("{status} {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: u16,
        /// Trimmed response body returned by the platform.
        snippet: String,
    },

    /// Timeout at transport level.
    #[error("request to platform timed out")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of platform response.
    #[error("invalid platform response: {0}")]
    InvalidResponse(String),

    /// Configuration problems (bad/missing tokens, base URL, etc.).
    #[error(transparent)]
    Config(#[from] PlatformConfigError),
}

/// Configuration and setup errors (base API URL, missing token, etc.).
#[derive(Debug, Error)]
pub enum PlatformConfigError {
    /// Missing required platform access token.
    #[error("missing platform token")]
    MissingToken,

    /// Invalid base API URL.
    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),
}

impl PlatformError {
    /// Builds an [`PlatformError::HttpStatus`] from a status and raw body text.
    pub fn http_status(status: u16, body: &str) -> Self {
        PlatformError::HttpStatus {
            status,
            snippet: make_snippet(body),
        }
    }
}

/// Collapses whitespace and cuts a response body down to a log-friendly size.
pub(crate) fn make_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_LIMIT {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(SNIPPET_LIMIT).collect();
    cut.push('…');
    cut
}

// ===== Mapping from reqwest::Error into PlatformError =====

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return PlatformError::Timeout;
        }

        if e.is_decode() {
            return PlatformError::InvalidResponse(e.to_string());
        }

        if let Some(status) = e.status() {
            return PlatformError::HttpStatus {
                status: status.as_u16(),
                snippet: String::new(),
            };
        }

        PlatformError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(e: serde_json::Error) -> Self {
        PlatformError::InvalidResponse(e.to_string())
    }
}
