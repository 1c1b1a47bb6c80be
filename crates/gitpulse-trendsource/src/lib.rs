//! Adapter for the remote trend index.
//!
//! [`TrendSourceClient`] fetches the ranked trending-repository list plus
//! per-repository language byte counts and README text; [`normalize_languages`]
//! turns raw byte counts into thresholded percentage shares.

mod client;
mod error;
mod normalize;
mod types;

pub use client::TrendSourceClient;
pub use error::TrendSourceError;
pub use normalize::{normalize_languages, primary_language};
pub use types::TrendingRepo;
