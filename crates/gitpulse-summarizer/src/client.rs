use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use gitpulse_core::RetryPolicy;

use crate::error::SummarizeError;

/// Character bound applied to README input before the remote call.
pub const MAX_README_CHARS: usize = 8_000;

/// Deterministic summary for repositories without usable README content.
pub const SENTINEL_SUMMARY: &str = "No README available for this repository.";

const MAX_COMPLETION_TOKENS: u32 = 300;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for an OpenAI-compatible chat-completions summarization service.
pub struct SummarizerClient {
    client: Client,
    base_url: Url,
    api_key: String,
    model: String,
    language: String,
    policy: RetryPolicy,
}

impl SummarizerClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`SummarizeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SummarizeError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        language: &str,
        timeout_secs: u64,
        policy: RetryPolicy,
    ) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("gitpulse/0.1 (trend-collection)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SummarizeError::InvalidBaseUrl {
            base_url: normalised.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            language: language.to_owned(),
            policy,
        })
    }

    /// Produces a short natural-language summary of `readme` for `repo_name`.
    ///
    /// Whitespace-only input returns [`SENTINEL_SUMMARY`] without a remote
    /// call. Otherwise the input is truncated to [`MAX_README_CHARS`] on a
    /// char boundary and sent to the completion endpoint; transient failures
    /// are retried per the configured policy.
    ///
    /// # Errors
    ///
    /// - [`SummarizeError::RateLimited`] / [`SummarizeError::UnexpectedStatus`]
    ///   once retries are exhausted (or immediately for non-5xx statuses).
    /// - [`SummarizeError::Deserialize`] if the response body is malformed.
    /// - [`SummarizeError::EmptyCompletion`] if no choices are returned.
    pub async fn summarize(
        &self,
        repo_name: &str,
        readme: &str,
    ) -> Result<String, SummarizeError> {
        if readme.trim().is_empty() {
            tracing::debug!(repo = repo_name, "empty README — returning sentinel summary");
            return Ok(SENTINEL_SUMMARY.to_string());
        }

        let input = truncate_to_char_boundary(readme, MAX_README_CHARS);
        let summary = self
            .policy
            .run(SummarizeError::is_transient, || {
                self.request_summary(repo_name, input)
            })
            .await?;

        tracing::debug!(repo = repo_name, chars = summary.len(), "generated summary");
        Ok(summary)
    }

    async fn request_summary(
        &self,
        repo_name: &str,
        readme: &str,
    ) -> Result<String, SummarizeError> {
        let url =
            self.base_url
                .join("chat/completions")
                .map_err(|e| SummarizeError::InvalidBaseUrl {
                    base_url: self.base_url.to_string(),
                    reason: e.to_string(),
                })?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Summarize this README for the repository '{repo_name}':\n\n{readme}"
                    ),
                },
            ],
            max_tokens: Some(MAX_COMPLETION_TOKENS),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SummarizeError::RateLimited);
        }
        if !status.is_success() {
            return Err(SummarizeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let completion: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| SummarizeError::Deserialize {
                context: format!("completion for {repo_name}"),
                source: e,
            })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(SummarizeError::EmptyCompletion)?;

        Ok(choice.message.content.trim().to_string())
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a technical documentation summarizer. Summarize GitHub README \
             content in {language}. Cover what the project does, its key features, \
             and its tech stack if mentioned. Keep the summary under 400 characters. \
             Do not include markdown formatting, links, or code.",
            language = self.language
        )
    }
}

/// Truncates `s` to at most `max` bytes, backing off to a valid char boundary.
fn truncate_to_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
