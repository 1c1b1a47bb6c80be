use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// One language's share of a repository's byte total, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageShare {
    pub language: String,
    pub percentage: f64,
}

/// Returns the Monday of the week containing `date`.
///
/// Weekly rollups are keyed by this date, so every day of a week maps to the
/// same aggregate row set.
#[must_use]
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}
