//! Database operations for `repo_snapshots`, `repo_languages`, and `summaries`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use gitpulse_core::LanguageShare;

use crate::DbError;

/// Insert payload for one repository snapshot.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub date: NaiveDate,
    pub repo_id: i64,
    pub repo_name: String,
    pub url: String,
    pub primary_language: Option<String>,
    pub description: Option<String>,
    pub readme_text: Option<String>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub rank: i64,
    pub score: Option<f64>,
}

/// One snapshot joined with its summary and ordered language breakdown, as
/// served by the trends query.
#[derive(Debug, Clone)]
pub struct TrendingSnapshot {
    pub repo_id: i64,
    pub repo_name: String,
    pub url: String,
    pub primary_language: Option<String>,
    pub languages: Vec<LanguageShare>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub rank: i64,
    pub score: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct SnapshotSummaryRow {
    repo_id: i64,
    repo_name: String,
    url: String,
    primary_language: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    stars: Option<i64>,
    forks: Option<i64>,
    rank: i64,
    score: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct LanguageRow {
    repo_id: i64,
    language: String,
    percentage: f64,
}

/// Insert or update the snapshot keyed by `(date, repo_id)`.
///
/// Re-running a collection for the same date updates fields in place and
/// never produces a duplicate row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_snapshot(pool: &SqlitePool, snapshot: &NewSnapshot) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO repo_snapshots \
             (date, repo_id, repo_name, url, primary_language, description, readme_text, \
              stars, forks, rank, score) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (date, repo_id) DO UPDATE SET \
             repo_name        = excluded.repo_name, \
             url              = excluded.url, \
             primary_language = excluded.primary_language, \
             description      = excluded.description, \
             readme_text      = excluded.readme_text, \
             stars            = excluded.stars, \
             forks            = excluded.forks, \
             rank             = excluded.rank, \
             score            = excluded.score",
    )
    .bind(snapshot.date)
    .bind(snapshot.repo_id)
    .bind(snapshot.repo_name.as_str())
    .bind(snapshot.url.as_str())
    .bind(snapshot.primary_language.as_deref())
    .bind(snapshot.description.as_deref())
    .bind(snapshot.readme_text.as_deref())
    .bind(snapshot.stars)
    .bind(snapshot.forks)
    .bind(snapshot.rank)
    .bind(snapshot.score)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the language breakdown for `(date, repo_id)` with `shares`.
///
/// Delete-then-insert inside one transaction, so a re-collected repository
/// never keeps language rows from a previous breakdown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn replace_repo_languages(
    pool: &SqlitePool,
    date: NaiveDate,
    repo_id: i64,
    shares: &[LanguageShare],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM repo_languages WHERE date = ? AND repo_id = ?")
        .bind(date)
        .bind(repo_id)
        .execute(&mut *tx)
        .await?;

    for share in shares {
        sqlx::query(
            "INSERT INTO repo_languages (date, repo_id, language, percentage) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(date)
        .bind(repo_id)
        .bind(share.language.as_str())
        .bind(share.percentage)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Insert or update the summary for `(date, repo_id)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_summary(
    pool: &SqlitePool,
    date: NaiveDate,
    repo_id: i64,
    text: &str,
    produced_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO summaries (date, repo_id, text, produced_at) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (date, repo_id) DO UPDATE SET \
             text        = excluded.text, \
             produced_at = excluded.produced_at",
    )
    .bind(date)
    .bind(repo_id)
    .bind(text)
    .bind(produced_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All snapshots for `date`, each joined with its summary (when present) and
/// its ordered language breakdown, sorted by rank ascending.
///
/// A date without data returns an empty vector.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn get_trends(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<TrendingSnapshot>, DbError> {
    let rows = sqlx::query_as::<_, SnapshotSummaryRow>(
        "SELECT s.repo_id, s.repo_name, s.url, s.primary_language, s.description, \
                m.text AS summary, s.stars, s.forks, s.rank, s.score \
         FROM repo_snapshots s \
         LEFT JOIN summaries m ON m.date = s.date AND m.repo_id = s.repo_id \
         WHERE s.date = ? \
         ORDER BY s.rank ASC, s.repo_id ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    let language_rows = sqlx::query_as::<_, LanguageRow>(
        "SELECT repo_id, language, percentage \
         FROM repo_languages \
         WHERE date = ? \
         ORDER BY repo_id ASC, percentage DESC, language ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    let mut languages_by_repo: HashMap<i64, Vec<LanguageShare>> = HashMap::new();
    for row in language_rows {
        languages_by_repo
            .entry(row.repo_id)
            .or_default()
            .push(LanguageShare {
                language: row.language,
                percentage: row.percentage,
            });
    }

    let snapshots = rows
        .into_iter()
        .map(|row| TrendingSnapshot {
            languages: languages_by_repo.remove(&row.repo_id).unwrap_or_default(),
            repo_id: row.repo_id,
            repo_name: row.repo_name,
            url: row.url,
            primary_language: row.primary_language,
            description: row.description,
            summary: row.summary,
            stars: row.stars,
            forks: row.forks,
            rank: row.rank,
            score: row.score,
        })
        .collect();

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot(date: NaiveDate, repo_id: i64, rank: i64) -> NewSnapshot {
        NewSnapshot {
            date,
            repo_id,
            repo_name: format!("acme/repo-{repo_id}"),
            url: format!("https://github.com/acme/repo-{repo_id}"),
            primary_language: Some("Rust".to_string()),
            description: Some("a test repository".to_string()),
            readme_text: Some("# readme".to_string()),
            stars: Some(100),
            forks: Some(5),
            rank,
            score: Some(90.0),
        }
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upsert_snapshot_is_idempotent_per_date_and_repo(pool: SqlitePool) {
        let date = test_date();
        let mut snapshot = sample_snapshot(date, 1, 1);
        upsert_snapshot(&pool, &snapshot).await.expect("insert");

        snapshot.stars = Some(250);
        upsert_snapshot(&pool, &snapshot).await.expect("update");

        let trends = get_trends(&pool, date).await.expect("read");
        assert_eq!(trends.len(), 1, "upsert must not duplicate");
        assert_eq!(trends[0].stars, Some(250), "upsert must update fields");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn replace_repo_languages_discards_stale_rows(pool: SqlitePool) {
        let date = test_date();
        upsert_snapshot(&pool, &sample_snapshot(date, 1, 1))
            .await
            .expect("insert");

        let first = vec![
            LanguageShare {
                language: "Rust".to_string(),
                percentage: 60.0,
            },
            LanguageShare {
                language: "C".to_string(),
                percentage: 40.0,
            },
        ];
        replace_repo_languages(&pool, date, 1, &first)
            .await
            .expect("first breakdown");

        let second = vec![LanguageShare {
            language: "Rust".to_string(),
            percentage: 100.0,
        }];
        replace_repo_languages(&pool, date, 1, &second)
            .await
            .expect("second breakdown");

        let trends = get_trends(&pool, date).await.expect("read");
        assert_eq!(trends[0].languages, second, "old C row must be gone");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_trends_orders_by_rank_and_joins_summaries(pool: SqlitePool) {
        let date = test_date();
        upsert_snapshot(&pool, &sample_snapshot(date, 20, 2))
            .await
            .expect("insert");
        upsert_snapshot(&pool, &sample_snapshot(date, 10, 1))
            .await
            .expect("insert");
        upsert_summary(&pool, date, 10, "the top repository", Utc::now())
            .await
            .expect("summary");

        let trends = get_trends(&pool, date).await.expect("read");
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].repo_id, 10, "rank 1 first");
        assert_eq!(trends[0].summary.as_deref(), Some("the top repository"));
        assert_eq!(trends[1].repo_id, 20);
        assert!(trends[1].summary.is_none(), "absent summary is valid");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_trends_returns_empty_for_dataless_date(pool: SqlitePool) {
        let trends = get_trends(&pool, test_date()).await.expect("read");
        assert!(trends.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn language_breakdown_is_ordered_by_share(pool: SqlitePool) {
        let date = test_date();
        upsert_snapshot(&pool, &sample_snapshot(date, 1, 1))
            .await
            .expect("insert");
        replace_repo_languages(
            &pool,
            date,
            1,
            &[
                LanguageShare {
                    language: "Shell".to_string(),
                    percentage: 10.0,
                },
                LanguageShare {
                    language: "Rust".to_string(),
                    percentage: 90.0,
                },
            ],
        )
        .await
        .expect("breakdown");

        let trends = get_trends(&pool, date).await.expect("read");
        let languages: Vec<&str> = trends[0]
            .languages
            .iter()
            .map(|s| s.language.as_str())
            .collect();
        assert_eq!(languages, vec!["Rust", "Shell"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn upsert_summary_updates_in_place(pool: SqlitePool) {
        let date = test_date();
        upsert_snapshot(&pool, &sample_snapshot(date, 1, 1))
            .await
            .expect("insert");
        upsert_summary(&pool, date, 1, "first draft", Utc::now())
            .await
            .expect("first");
        upsert_summary(&pool, date, 1, "second draft", Utc::now())
            .await
            .expect("second");

        let trends = get_trends(&pool, date).await.expect("read");
        assert_eq!(trends[0].summary.as_deref(), Some("second draft"));
    }
}
