//! Error type shared by the API client, token manager, renderers, and server.

use thiserror::Error;

/// Errors that can occur while talking to newsfilter.io or rendering its pages.
#[derive(Debug, Error)]
pub enum NewsfilterError {
    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The search or page endpoint answered with a non-success status.
    #[error("Failed to fetch articles: {status} {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The refresh endpoint rejected our refresh token.
    #[error("Failed to refresh token: {status} {body}")]
    TokenRefresh { status: u16, body: String },

    /// No token of the named kind is available.
    #[error("No {0} token configured")]
    MissingToken(&'static str),

    #[error("Invalid ticker symbol: {0:?}")]
    InvalidSymbol(String),

    /// Headless Chrome failed to launch, navigate, or evaluate.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Browser login finished without observing a token-bearing response.
    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NewsfilterError>;

impl NewsfilterError {
    /// Wrap any displayable browser failure.
    pub fn browser(e: impl std::fmt::Display) -> Self {
        NewsfilterError::Browser(e.to_string())
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors (4xx) are permanent except for request timeouts (408) and
    /// rate limiting (429).
    ///
    /// # Returns
    ///
    /// `false` for token, symbol, configuration and permanent status errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            NewsfilterError::Status { status, .. } => {
                !(400..500).contains(status) || matches!(status, 408 | 429)
            }
            NewsfilterError::MissingToken(_)
            | NewsfilterError::TokenRefresh { .. }
            | NewsfilterError::InvalidSymbol(_)
            | NewsfilterError::Config(_) => false,
            _ => true,
        }
    }
}
