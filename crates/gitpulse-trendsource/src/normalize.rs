//! Language byte counts → thresholded percentage shares.

use std::cmp::Ordering;
use std::collections::HashMap;

use gitpulse_core::LanguageShare;

/// Converts raw per-language byte counts into percentage shares of the total.
///
/// Entries below `min_share_pct` (percentage points) are dropped; the
/// remaining shares are left as shares of the true byte total, not
/// renormalized to 100. Results are sorted by percentage descending with ties
/// broken by language name ascending, so output order is deterministic.
///
/// A zero byte total (including an empty map) produces an empty vector.
#[must_use]
pub fn normalize_languages(raw: &HashMap<String, u64>, min_share_pct: f64) -> Vec<LanguageShare> {
    let total: u64 = raw.values().sum();
    if total == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let total = total as f64;

    let mut shares: Vec<LanguageShare> = raw
        .iter()
        .map(|(language, bytes)| {
            #[allow(clippy::cast_precision_loss)]
            let percentage = (*bytes as f64 / total) * 100.0;
            LanguageShare {
                language: language.clone(),
                percentage,
            }
        })
        .filter(|share| share.percentage >= min_share_pct)
        .collect();

    shares.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.language.cmp(&b.language))
    });

    shares
}

/// The dominant language of a normalized breakdown: its first entry.
#[must_use]
pub fn primary_language(shares: &[LanguageShare]) -> Option<&str> {
    shares.first().map(|s| s.language.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_counts(entries: &[(&str, u64)]) -> HashMap<String, u64> {
        entries
            .iter()
            .map(|(lang, bytes)| ((*lang).to_string(), *bytes))
            .collect()
    }

    #[test]
    fn shares_are_thresholded_and_ordered() {
        let raw = byte_counts(&[("Python", 800), ("Rust", 150), ("Shell", 50)]);
        let shares = normalize_languages(&raw, 10.0);

        assert_eq!(shares.len(), 2, "Shell at 5% must be dropped");
        assert_eq!(shares[0].language, "Python");
        assert!((shares[0].percentage - 80.0).abs() < 1e-9);
        assert_eq!(shares[1].language, "Rust");
        assert!((shares[1].percentage - 15.0).abs() < 1e-9);
        assert_eq!(primary_language(&shares), Some("Python"));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let shares = normalize_languages(&HashMap::new(), 10.0);
        assert!(shares.is_empty());
        assert_eq!(primary_language(&shares), None);
    }

    #[test]
    fn zero_total_does_not_divide() {
        let raw = byte_counts(&[("Rust", 0), ("C", 0)]);
        assert!(normalize_languages(&raw, 10.0).is_empty());
    }

    #[test]
    fn ties_break_by_language_name() {
        let raw = byte_counts(&[("Zig", 500), ("Ada", 500)]);
        let shares = normalize_languages(&raw, 0.0);
        assert_eq!(shares[0].language, "Ada");
        assert_eq!(shares[1].language, "Zig");
    }

    #[test]
    fn dropped_entries_are_not_renormalized() {
        let raw = byte_counts(&[("Python", 800), ("Rust", 150), ("Shell", 50)]);
        let shares = normalize_languages(&raw, 10.0);
        let sum: f64 = shares.iter().map(|s| s.percentage).sum();
        // 80 + 15: shares remain fractions of the true total.
        assert!((sum - 95.0).abs() < 1e-9);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let raw = byte_counts(&[("Python", 900), ("Shell", 100)]);
        let shares = normalize_languages(&raw, 10.0);
        assert_eq!(shares.len(), 2, "exactly 10% must survive a 10% threshold");
    }
}
