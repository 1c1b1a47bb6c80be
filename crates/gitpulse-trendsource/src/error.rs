use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendSourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by trend index (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl TrendSourceError {
    /// Returns `true` for errors worth retrying after a back-off delay.
    ///
    /// **Retriable:** network-level failures (timeout, connection reset),
    /// HTTP 429, and 5xx responses.
    ///
    /// **Not retriable:** 404s, other 4xx statuses, malformed bodies, and
    /// configuration errors — repeating the request returns the same result.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            TrendSourceError::Http(e) => e.is_timeout() || e.is_connect(),
            TrendSourceError::RateLimited { .. } => true,
            TrendSourceError::UnexpectedStatus { status, .. } => *status >= 500,
            TrendSourceError::Deserialize { .. }
            | TrendSourceError::NotFound { .. }
            | TrendSourceError::InvalidBaseUrl { .. } => false,
        }
    }
}
