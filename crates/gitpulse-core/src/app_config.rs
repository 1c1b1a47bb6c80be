use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_path: PathBuf,
    pub trend_index_base_url: String,
    pub trend_index_token: Option<String>,
    pub summarizer_base_url: String,
    pub summarizer_api_key: String,
    pub summarizer_model: String,
    pub summary_language: String,
    /// Fraction of the byte total below which a language is dropped from a
    /// repository's breakdown (0.2 → languages under 20 % are discarded).
    pub language_threshold: f64,
    pub request_timeout_secs: u64,
    pub collect_workers: usize,
    pub max_repos: usize,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("db_path", &self.db_path)
            .field("trend_index_base_url", &self.trend_index_base_url)
            .field(
                "trend_index_token",
                &self.trend_index_token.as_ref().map(|_| "[redacted]"),
            )
            .field("summarizer_base_url", &self.summarizer_base_url)
            .field("summarizer_api_key", &"[redacted]")
            .field("summarizer_model", &self.summarizer_model)
            .field("summary_language", &self.summary_language)
            .field("language_threshold", &self.language_threshold)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("collect_workers", &self.collect_workers)
            .field("max_repos", &self.max_repos)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            db_path: PathBuf::from("./data/gitpulse.db"),
            trend_index_base_url: "https://index.example.com".to_string(),
            trend_index_token: Some("secret-token".to_string()),
            summarizer_base_url: "https://llm.example.com".to_string(),
            summarizer_api_key: "secret-key".to_string(),
            summarizer_model: "test-model".to_string(),
            summary_language: "English".to_string(),
            language_threshold: 0.2,
            request_timeout_secs: 30,
            collect_workers: 4,
            max_repos: 50,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("[redacted]"));
    }
}
