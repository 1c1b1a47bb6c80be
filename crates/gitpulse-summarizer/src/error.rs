use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by summarizer")]
    RateLimited,

    #[error("unexpected HTTP status {status} from summarizer")]
    UnexpectedStatus { status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("summarizer returned no completion choices")]
    EmptyCompletion,

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl SummarizeError {
    /// Returns `true` for errors worth retrying after a back-off delay.
    ///
    /// Timeouts, connection failures, 429s, and 5xx responses are transient;
    /// auth failures and malformed responses are not — retrying them only
    /// burns the request budget.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SummarizeError::Http(e) => e.is_timeout() || e.is_connect(),
            SummarizeError::RateLimited => true,
            SummarizeError::UnexpectedStatus { status } => *status >= 500,
            SummarizeError::Deserialize { .. }
            | SummarizeError::EmptyCompletion
            | SummarizeError::InvalidBaseUrl { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_transient() {
        assert!(SummarizeError::RateLimited.is_transient());
    }

    #[test]
    fn server_error_is_transient() {
        assert!(SummarizeError::UnexpectedStatus { status: 502 }.is_transient());
    }

    #[test]
    fn auth_failure_is_permanent() {
        assert!(!SummarizeError::UnexpectedStatus { status: 401 }.is_transient());
    }

    #[test]
    fn empty_completion_is_permanent() {
        assert!(!SummarizeError::EmptyCompletion.is_transient());
    }
}
