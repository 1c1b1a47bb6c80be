//! Daily and weekly language-trend rollups.
//!
//! Both rollup tables are fully derived from `repo_languages`: recomputation
//! deletes the period's rows and re-aggregates inside one transaction, so the
//! rollups can be rebuilt from snapshots at any time with the same result.

use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;

use gitpulse_core::week_start_of;

use crate::DbError;

/// A row from `daily_language_trends`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailyTrendRow {
    pub date: NaiveDate,
    pub language: String,
    pub normalized_percentage: f64,
    pub repo_count: i64,
}

/// A row from `weekly_language_trends`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WeeklyTrendRow {
    pub week_start: NaiveDate,
    pub language: String,
    pub normalized_percentage: f64,
    pub repo_count: i64,
}

/// Rebuild `daily_language_trends` for `date` from `repo_languages`.
///
/// Per-language shares are summed over every repository trending on `date`
/// and renormalized so the day's percentages total 100. `repo_count` is the
/// number of repositories in which the language appears.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn recompute_daily_trends(pool: &SqlitePool, date: NaiveDate) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM daily_language_trends WHERE date = ?1")
        .bind(date)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO daily_language_trends (date, language, normalized_percentage, repo_count) \
         SELECT date, language, \
                100.0 * SUM(percentage) / \
                    (SELECT SUM(percentage) FROM repo_languages WHERE date = ?1), \
                COUNT(*) \
         FROM repo_languages \
         WHERE date = ?1 \
         GROUP BY language",
    )
    .bind(date)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::debug!(%date, "recomputed daily language trends");
    Ok(())
}

/// Rebuild `weekly_language_trends` for the Monday-based week containing
/// `date`.
///
/// Shares are aggregated over every `(repository, day)` pair of the week —
/// a repository trending on three days contributes three times — and
/// renormalized so the week's percentages total 100.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn recompute_weekly_trends(pool: &SqlitePool, date: NaiveDate) -> Result<(), DbError> {
    let week_start = week_start_of(date);
    let week_end = week_start + Days::new(6);

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM weekly_language_trends WHERE week_start = ?1")
        .bind(week_start)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO weekly_language_trends \
             (week_start, language, normalized_percentage, repo_count) \
         SELECT ?1, language, \
                100.0 * SUM(percentage) / \
                    (SELECT SUM(percentage) FROM repo_languages \
                     WHERE date BETWEEN ?2 AND ?3), \
                COUNT(*) \
         FROM repo_languages \
         WHERE date BETWEEN ?2 AND ?3 \
         GROUP BY language",
    )
    .bind(week_start)
    .bind(week_start)
    .bind(week_end)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::debug!(%week_start, "recomputed weekly language trends");
    Ok(())
}

/// Daily trend rows for `date`, ordered by share descending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_daily_language_trends(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<DailyTrendRow>, DbError> {
    let rows = sqlx::query_as::<_, DailyTrendRow>(
        "SELECT date, language, normalized_percentage, repo_count \
         FROM daily_language_trends \
         WHERE date = ? \
         ORDER BY normalized_percentage DESC, language ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Weekly trend rows for the week containing `date`, ordered by share
/// descending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_weekly_language_trends(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<WeeklyTrendRow>, DbError> {
    let rows = sqlx::query_as::<_, WeeklyTrendRow>(
        "SELECT week_start, language, normalized_percentage, repo_count \
         FROM weekly_language_trends \
         WHERE week_start = ? \
         ORDER BY normalized_percentage DESC, language ASC",
    )
    .bind(week_start_of(date))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
