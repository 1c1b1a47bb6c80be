use serde::Deserialize;

/// Wire envelope for the trend index's trending-repositories endpoint.
///
/// The index returns a columnar payload; only `data.rows` is consumed, and
/// every row field arrives as an optional string regardless of its logical
/// type.
#[derive(Debug, Deserialize)]
pub(crate) struct TrendingListResponse {
    pub data: TrendingListData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingListData {
    pub rows: Vec<RawTrendingRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrendingRow {
    pub repo_id: String,
    pub repo_name: String,
    pub primary_language: Option<String>,
    pub description: Option<String>,
    pub stars: Option<String>,
    pub forks: Option<String>,
    pub total_score: Option<String>,
}

/// One entry of the ranked trending list, with row fields parsed into their
/// logical types and `rank` assigned from list position (1-based).
#[derive(Debug, Clone)]
pub struct TrendingRepo {
    pub repo_id: i64,
    pub repo_name: String,
    pub primary_language: Option<String>,
    pub description: Option<String>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub score: Option<f64>,
    pub rank: i64,
}

impl TrendingRepo {
    pub(crate) fn from_raw(raw: RawTrendingRow, rank: i64) -> Option<Self> {
        let Ok(repo_id) = raw.repo_id.parse::<i64>() else {
            tracing::warn!(
                repo = %raw.repo_name,
                raw_id = %raw.repo_id,
                "skipping trending row with unparseable repo id"
            );
            return None;
        };

        Some(TrendingRepo {
            repo_id,
            repo_name: raw.repo_name,
            primary_language: raw.primary_language,
            description: raw.description,
            stars: raw.stars.as_deref().and_then(|s| s.parse().ok()),
            forks: raw.forks.as_deref().and_then(|s| s.parse().ok()),
            score: raw.total_score.as_deref().and_then(|s| s.parse().ok()),
            rank,
        })
    }
}
