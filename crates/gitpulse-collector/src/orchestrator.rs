//! The collection pipeline: fetch → normalize → summarize → persist.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;

use gitpulse_core::{AppConfig, RetryPolicy};
use gitpulse_db::NewSnapshot;
use gitpulse_summarizer::SummarizerClient;
use gitpulse_trendsource::{
    normalize_languages, primary_language, TrendSourceClient, TrendSourceError, TrendingRepo,
};

use crate::error::CollectError;
use crate::progress::ProgressTracker;

/// Result of a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The pipeline was started; follow the progress stream for updates.
    Started,
    /// A run is already in flight; no new work was started.
    AlreadyRunning,
}

/// Tuning knobs for the pipeline, split from the remote clients so tests can
/// use zero-delay retries and tiny limits.
#[derive(Debug, Clone, Copy)]
pub struct CollectorOptions {
    /// Fraction of a repository's byte total below which a language is
    /// dropped (0.2 → 20 %).
    pub language_threshold: f64,
    pub workers: usize,
    pub max_repos: usize,
    pub retry: RetryPolicy,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            language_threshold: 0.2,
            workers: 4,
            max_repos: 50,
            retry: RetryPolicy::default(),
        }
    }
}

/// Drives one collection run end-to-end and owns the single-flight slot.
pub struct Collector {
    trend_source: TrendSourceClient,
    summarizer: SummarizerClient,
    pool: SqlitePool,
    progress: ProgressTracker,
    options: CollectorOptions,
}

impl Collector {
    #[must_use]
    pub fn new(
        trend_source: TrendSourceClient,
        summarizer: SummarizerClient,
        pool: SqlitePool,
        options: CollectorOptions,
    ) -> Self {
        Self {
            trend_source,
            summarizer,
            pool,
            progress: ProgressTracker::new(),
            options,
        }
    }

    /// Builds the collector and both remote clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if either client cannot be constructed.
    pub fn from_config(config: &AppConfig, pool: SqlitePool) -> Result<Self, CollectError> {
        let retry = RetryPolicy::new(config.max_retries, config.retry_base_delay_ms);

        let trend_source = TrendSourceClient::new(
            &config.trend_index_base_url,
            config.trend_index_token.clone(),
            config.request_timeout_secs,
        )?;
        let summarizer = SummarizerClient::new(
            &config.summarizer_base_url,
            &config.summarizer_api_key,
            &config.summarizer_model,
            &config.summary_language,
            config.request_timeout_secs,
            retry,
        )?;

        Ok(Self::new(
            trend_source,
            summarizer,
            pool,
            CollectorOptions {
                language_threshold: config.language_threshold,
                workers: config.collect_workers,
                max_repos: config.max_repos,
                retry,
            },
        ))
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Starts a collection run for `date` unless one is already in flight.
    ///
    /// The compare-and-set on the progress tracker guarantees at most one run
    /// process-wide; the winner launches the pipeline as a background task
    /// and returns immediately.
    pub fn trigger(self: Arc<Self>, date: NaiveDate) -> TriggerOutcome {
        if !self.progress.try_start() {
            tracing::info!(%date, "collection trigger rejected, run already in flight");
            return TriggerOutcome::AlreadyRunning;
        }

        tokio::spawn(async move {
            self.run_locked(date).await;
        });

        TriggerOutcome::Started
    }

    /// Runs the pipeline to completion and releases the single-flight slot.
    ///
    /// The caller must have acquired the slot via `progress.try_start()`.
    async fn run_locked(&self, date: NaiveDate) {
        tracing::info!(%date, "starting collection run");
        let outcome = self.run_pipeline(date).await;

        // Rollups are derived purely from whatever reached storage, so they
        // are rebuilt even after a fatal abort.
        self.recompute_trends(date).await;

        match outcome {
            Ok(count) => {
                tracing::info!(%date, count, "collection run complete");
                self.progress
                    .finish(format!("completed: {count} repositories"));
            }
            Err(e) => {
                tracing::error!(%date, error = %e, "collection run failed");
                self.progress.finish(format!("failed: {e}"));
            }
        }
    }

    async fn run_pipeline(&self, date: NaiveDate) -> Result<usize, CollectError> {
        self.progress.set_total(0, "fetching trending list");

        let mut repos = self
            .options
            .retry
            .run(TrendSourceError::is_transient, || {
                self.trend_source.fetch_trending()
            })
            .await?;
        repos.truncate(self.options.max_repos);

        let total = repos.len();
        self.progress
            .set_total(total, format!("fetched {total} trending repositories"));

        let results: Vec<bool> = stream::iter(repos.into_iter())
            .map(|repo| async move { self.collect_repo(date, &repo).await })
            .buffer_unordered(self.options.workers.max(1))
            .collect()
            .await;

        let stored = results.into_iter().filter(|stored| *stored).count();
        if stored < total {
            tracing::warn!(
                stored,
                total,
                "some repositories failed to persist during collection"
            );
        }

        Ok(stored)
    }

    /// Enriches and persists one repository, degrading to a partial snapshot
    /// on remote failures. Returns whether the snapshot reached storage.
    async fn collect_repo(&self, date: NaiveDate, repo: &TrendingRepo) -> bool {
        let languages = match self.trend_source.fetch_languages(&repo.repo_name).await {
            Ok(raw) => normalize_languages(&raw, self.options.language_threshold * 100.0),
            Err(e) => {
                tracing::warn!(repo = %repo.repo_name, error = %e, "language fetch failed");
                Vec::new()
            }
        };

        let readme = match self.trend_source.fetch_readme(&repo.repo_name).await {
            Ok(readme) => readme,
            Err(e) => {
                tracing::warn!(repo = %repo.repo_name, error = %e, "README fetch failed");
                None
            }
        };

        // Prefer the computed breakdown; fall back to the index's own answer
        // when the breakdown is unavailable.
        let primary = primary_language(&languages)
            .map(ToOwned::to_owned)
            .or_else(|| repo.primary_language.clone());

        let snapshot = NewSnapshot {
            date,
            repo_id: repo.repo_id,
            repo_name: repo.repo_name.clone(),
            url: format!("https://github.com/{}", repo.repo_name),
            primary_language: primary,
            description: repo.description.clone(),
            readme_text: readme.clone(),
            stars: repo.stars,
            forks: repo.forks,
            rank: repo.rank,
            score: repo.score,
        };

        let mut stored = true;
        if let Err(e) = gitpulse_db::upsert_snapshot(&self.pool, &snapshot).await {
            tracing::error!(repo = %repo.repo_name, error = %e, "snapshot upsert failed");
            stored = false;
        } else if let Err(e) =
            gitpulse_db::replace_repo_languages(&self.pool, date, repo.repo_id, &languages).await
        {
            tracing::error!(repo = %repo.repo_name, error = %e, "language rows upsert failed");
        }

        if stored {
            if let Some(readme) = readme {
                self.summarize_repo(date, repo, &readme).await;
            }
        }

        self.progress.advance(repo.repo_name.clone());
        stored
    }

    async fn summarize_repo(&self, date: NaiveDate, repo: &TrendingRepo, readme: &str) {
        match self.summarizer.summarize(&repo.repo_name, readme).await {
            Ok(text) => {
                if let Err(e) =
                    gitpulse_db::upsert_summary(&self.pool, date, repo.repo_id, &text, Utc::now())
                        .await
                {
                    tracing::error!(repo = %repo.repo_name, error = %e, "summary upsert failed");
                }
            }
            Err(e) => {
                tracing::warn!(
                    repo = %repo.repo_name,
                    error = %e,
                    "summarization failed — snapshot kept without summary"
                );
            }
        }
    }

    async fn recompute_trends(&self, date: NaiveDate) {
        if let Err(e) = gitpulse_db::recompute_daily_trends(&self.pool, date).await {
            tracing::error!(%date, error = %e, "daily trend recompute failed");
        }
        if let Err(e) = gitpulse_db::recompute_weekly_trends(&self.pool, date).await {
            tracing::error!(%date, error = %e, "weekly trend recompute failed");
        }
    }
}
