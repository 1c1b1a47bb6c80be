use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("trend index error: {0}")]
    TrendSource(#[from] gitpulse_trendsource::TrendSourceError),

    #[error("summarizer error: {0}")]
    Summarize(#[from] gitpulse_summarizer::SummarizeError),

    #[error("storage error: {0}")]
    Db(#[from] gitpulse_db::DbError),
}
