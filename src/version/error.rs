use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-level failure of a single request.
///
/// Cloneable so that memoized outcomes can be handed out more than once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Failed to fetch URL {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Blocked by anti-bot protection: {url}")]
    Blocked { url: String },

    #[error("No vendor pattern matches URL: {0}")]
    UnknownVendor(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
