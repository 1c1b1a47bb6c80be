//! HTTP client for the remote trend index.
//!
//! Wraps `reqwest` with typed error classification (429 → rate-limited,
//! 404 → not-found, 5xx → transient) and optional bearer authentication.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::TrendSourceError;
use crate::types::{TrendingListResponse, TrendingRepo};

const TRENDING_PATH: &str = "v1/trends/repos/";

/// Client for the trend index REST API.
///
/// Use [`TrendSourceClient::new`] for production or point `base_url` at a
/// mock server in tests.
pub struct TrendSourceClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl TrendSourceClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`TrendSourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`TrendSourceError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, TrendSourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("gitpulse/0.1 (trend-collection)")
            .build()?;

        // Normalise: exactly one trailing slash so Url::join appends paths
        // instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|e| TrendSourceError::InvalidBaseUrl {
                base_url: normalised.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Fetches the ranked trending-repository list.
    ///
    /// Rows with unparseable repository ids are dropped with a warning; the
    /// surviving entries carry their 1-based list position as `rank`.
    ///
    /// # Errors
    ///
    /// - [`TrendSourceError::RateLimited`] on HTTP 429.
    /// - [`TrendSourceError::UnexpectedStatus`] on other non-2xx statuses.
    /// - [`TrendSourceError::Http`] on network failure.
    /// - [`TrendSourceError::Deserialize`] if the envelope does not match.
    pub async fn fetch_trending(&self) -> Result<Vec<TrendingRepo>, TrendSourceError> {
        let url = self.join(TRENDING_PATH)?;
        let body = self.get_text(&url).await?;

        let envelope: TrendingListResponse =
            serde_json::from_str(&body).map_err(|e| TrendSourceError::Deserialize {
                context: "trending list".to_string(),
                source: e,
            })?;

        let repos: Vec<TrendingRepo> = envelope
            .data
            .rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let rank = i64::try_from(i).unwrap_or(i64::MAX).saturating_add(1);
                TrendingRepo::from_raw(raw, rank)
            })
            .collect();

        tracing::info!(count = repos.len(), "fetched trending repositories");
        Ok(repos)
    }

    /// Fetches the language byte counts for one repository.
    ///
    /// # Errors
    ///
    /// Same classification as [`TrendSourceClient::fetch_trending`], plus
    /// [`TrendSourceError::NotFound`] on 404.
    pub async fn fetch_languages(
        &self,
        repo_name: &str,
    ) -> Result<HashMap<String, u64>, TrendSourceError> {
        let url = self.join(&format!("repos/{repo_name}/languages"))?;
        let body = self.get_text(&url).await?;

        serde_json::from_str(&body).map_err(|e| TrendSourceError::Deserialize {
            context: format!("languages for {repo_name}"),
            source: e,
        })
    }

    /// Fetches the raw README text for one repository.
    ///
    /// Returns `Ok(None)` when the repository has no README (404); all other
    /// failures are surfaced as errors.
    ///
    /// # Errors
    ///
    /// Same classification as [`TrendSourceClient::fetch_trending`].
    pub async fn fetch_readme(&self, repo_name: &str) -> Result<Option<String>, TrendSourceError> {
        let url = self.join(&format!("repos/{repo_name}/readme"))?;

        let response = self
            .request(&url, "application/vnd.github.raw+json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(repo = repo_name, "no README found");
                Ok(None)
            }
            status => {
                Self::check_status(status, &url)?;
                let text = response.text().await?;
                tracing::debug!(repo = repo_name, chars = text.len(), "fetched README");
                Ok(Some(text))
            }
        }
    }

    fn join(&self, path: &str) -> Result<Url, TrendSourceError> {
        self.base_url
            .join(path)
            .map_err(|e| TrendSourceError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn request(&self, url: &Url, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url.clone()).header("Accept", accept);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Sends a GET request, classifies the status, and returns the body text.
    async fn get_text(&self, url: &Url) -> Result<String, TrendSourceError> {
        let response = self.request(url, "application/json").send().await?;
        let retry_after = parse_retry_after(&response);
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendSourceError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(60),
            });
        }
        Self::check_status(status, url)?;
        Ok(response.text().await?)
    }

    fn check_status(status: StatusCode, url: &Url) -> Result<(), TrendSourceError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TrendSourceError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(TrendSourceError::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(TrendSourceError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> TrendSourceClient {
        TrendSourceClient::new(base_url, None, 30)
            .expect("client construction should not fail")
    }

    #[test]
    fn join_appends_to_base_path() {
        let client = test_client("https://index.example.com");
        let url = client.join("repos/acme/widget/languages").unwrap();
        assert_eq!(
            url.as_str(),
            "https://index.example.com/repos/acme/widget/languages"
        );
    }

    #[test]
    fn join_tolerates_trailing_slash_in_base() {
        let client = test_client("https://index.example.com/");
        let url = client.join(TRENDING_PATH).unwrap();
        assert_eq!(url.as_str(), "https://index.example.com/v1/trends/repos/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = TrendSourceClient::new("not a url", None, 30);
        assert!(matches!(
            result,
            Err(TrendSourceError::InvalidBaseUrl { .. })
        ));
    }
}
