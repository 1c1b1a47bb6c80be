use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use gitpulse_core::LanguageShare;
use gitpulse_db::TrendingSnapshot;

use super::{bad_request, internal_error, resolve_date, ApiResponse, AppState, DateQuery};

#[derive(Debug, Serialize)]
pub(super) struct TrendingRepoItem {
    rank: i64,
    repo_id: i64,
    repo_name: String,
    url: String,
    primary_language: Option<String>,
    languages: Vec<LanguageShare>,
    description: Option<String>,
    summary: Option<String>,
    stars: Option<i64>,
    forks: Option<i64>,
    score: Option<f64>,
}

impl From<TrendingSnapshot> for TrendingRepoItem {
    fn from(snapshot: TrendingSnapshot) -> Self {
        Self {
            rank: snapshot.rank,
            repo_id: snapshot.repo_id,
            repo_name: snapshot.repo_name,
            url: snapshot.url,
            primary_language: snapshot.primary_language,
            languages: snapshot.languages,
            description: snapshot.description,
            summary: snapshot.summary,
            stars: snapshot.stars,
            forks: snapshot.forks,
            score: snapshot.score,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DailyTrendItem {
    date: NaiveDate,
    language: String,
    normalized_percentage: f64,
    repo_count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct WeeklyTrendItem {
    week_start: NaiveDate,
    language: String,
    normalized_percentage: f64,
    repo_count: i64,
}

pub(super) async fn get_trends(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Response {
    let date = match resolve_date(&query) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    match gitpulse_db::get_trends(&state.pool, date).await {
        Ok(snapshots) => {
            let items: Vec<TrendingRepoItem> =
                snapshots.into_iter().map(TrendingRepoItem::from).collect();
            Json(ApiResponse::ok(items)).into_response()
        }
        Err(e) => internal_error(&e),
    }
}

pub(super) async fn get_daily_languages(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Response {
    let date = match resolve_date(&query) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    match gitpulse_db::get_daily_language_trends(&state.pool, date).await {
        Ok(rows) => {
            let items: Vec<DailyTrendItem> = rows
                .into_iter()
                .map(|row| DailyTrendItem {
                    date: row.date,
                    language: row.language,
                    normalized_percentage: row.normalized_percentage,
                    repo_count: row.repo_count,
                })
                .collect();
            Json(ApiResponse::ok(items)).into_response()
        }
        Err(e) => internal_error(&e),
    }
}

pub(super) async fn get_weekly_languages(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Response {
    let date = match resolve_date(&query) {
        Ok(date) => date,
        Err(message) => return bad_request(message),
    };

    match gitpulse_db::get_weekly_language_trends(&state.pool, date).await {
        Ok(rows) => {
            let items: Vec<WeeklyTrendItem> = rows
                .into_iter()
                .map(|row| WeeklyTrendItem {
                    week_start: row.week_start,
                    language: row.language,
                    normalized_percentage: row.normalized_percentage,
                    repo_count: row.repo_count,
                })
                .collect();
            Json(ApiResponse::ok(items)).into_response()
        }
        Err(e) => internal_error(&e),
    }
}
