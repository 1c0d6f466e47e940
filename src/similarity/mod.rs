//! Ranking candidate language profiles against a query profile.
//!
//! Each shared metric contributes the Euclidean distance between the two
//! normalized histograms, scaled by its configured weight. Lower scores mean
//! more similar profiles.

pub mod report;
mod weights;

pub use weights::WeightConfig;

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::profile::{LanguageProfile, LengthHistogram, Metric, UnknownMetric};

#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("Candidate '{candidate}' shares no metric with the query profile")]
    InconsistentProfile { candidate: String },
    #[error("Weight for '{metric}' must be a finite, non-negative number, got {weight}")]
    InvalidWeight { metric: Metric, weight: f64 },
    #[error(transparent)]
    UnknownMetric(#[from] UnknownMetric),
    #[error("Invalid weights JSON: {0}")]
    InvalidWeights(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub candidate: String,
    /// Distance for every metric present in both profiles.
    pub distances: BTreeMap<Metric, f64>,
    /// Weighted sum of `distances`.
    pub score: f64,
}

/// Euclidean distance between two normalized histograms over the union of
/// their keys; a key missing on one side counts as probability 0.
pub fn distance(a: &LengthHistogram, b: &LengthHistogram) -> f64 {
    let mut left = a.iter().peekable();
    let mut right = b.iter().peekable();
    let mut sum = 0.0;

    loop {
        let next_left = left.peek().map(|&(key, p)| (key, p));
        let next_right = right.peek().map(|&(key, p)| (key, p));
        let diff = match (next_left, next_right) {
            (Some((ka, pa)), Some((kb, pb))) => match ka.cmp(kb) {
                Ordering::Less => {
                    left.next();
                    pa
                }
                Ordering::Greater => {
                    right.next();
                    pb
                }
                Ordering::Equal => {
                    left.next();
                    right.next();
                    pa - pb
                }
            },
            (Some((_, pa)), None) => {
                left.next();
                pa
            }
            (None, Some((_, pb))) => {
                right.next();
                pb
            }
            (None, None) => break,
        };
        sum += diff * diff;
    }

    sum.sqrt()
}

/// Score one candidate. Metrics missing from either side are skipped.
pub fn score_candidate(
    query: &LanguageProfile,
    candidate_id: &str,
    candidate: &LanguageProfile,
    weights: &WeightConfig,
) -> Result<ScoreResult, ScoreError> {
    let distances: BTreeMap<Metric, f64> = query
        .metrics()
        .filter_map(|(metric, query_histogram)| {
            candidate
                .metric(metric)
                .map(|candidate_histogram| (metric, distance(query_histogram, candidate_histogram)))
        })
        .collect();

    if distances.is_empty() {
        return Err(ScoreError::InconsistentProfile {
            candidate: candidate_id.to_string(),
        });
    }

    let score = distances
        .iter()
        .map(|(metric, d)| d * weights.weight(*metric))
        .sum();

    Ok(ScoreResult {
        candidate: candidate_id.to_string(),
        distances,
        score,
    })
}

/// Rank `candidates` by ascending weighted distance to `query`.
///
/// Ties are broken by candidate id, so the order is total and repeatable.
pub fn score(
    query: &LanguageProfile,
    candidates: &[(String, LanguageProfile)],
    weights: &WeightConfig,
) -> Result<Vec<ScoreResult>, ScoreError> {
    let mut results = candidates
        .iter()
        .map(|(id, candidate)| score_candidate(query, id, candidate, weights))
        .collect::<Result<Vec<_>, _>>()?;

    results.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });

    tracing::debug!(
        candidates = results.len(),
        best = results.first().map(|r| r.candidate.as_str()),
        "Scored candidates"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{HistogramOptions, histogram};
    use crate::profile::LengthKey;

    fn profile(words: &[&str]) -> LanguageProfile {
        histogram(words.iter().copied(), &HistogramOptions::default()).unwrap()
    }

    #[test]
    fn test_distance_identical_is_zero() {
        let p = profile(&["the", "cat", "sat", "on", "a", "mat"]);
        let h = p.metric(Metric::OneGramLengths).unwrap();
        assert_eq!(distance(h, h), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric_over_key_union() {
        let a = profile(&["a", "bb"]);
        let b = profile(&["ccc"]);
        let ha = a.metric(Metric::OneGramLengths).unwrap();
        let hb = b.metric(Metric::OneGramLengths).unwrap();
        // {1: .5, 2: .5} vs {3: 1}
        let expected = (0.25f64 + 0.25 + 1.0).sqrt();
        assert!((distance(ha, hb) - expected).abs() < 1e-12);
        assert_eq!(distance(ha, hb), distance(hb, ha));
    }

    #[test]
    fn test_identical_candidate_ranks_first() {
        let query = profile(&["cat", "dog", "cow"]);
        let same = profile(&["pig", "hen", "elk"]);
        let different = profile(&["a", "horse", "a"]);
        let weights = WeightConfig::from_json(r#"{"1-gram lengths": 1}"#).unwrap();

        let results = score(
            &query,
            &[("Y".to_string(), different), ("X".to_string(), same)],
            &weights,
        )
        .unwrap();

        assert_eq!(results[0].candidate, "X");
        assert_eq!(results[0].score, 0.0);
        assert_eq!(results[1].candidate, "Y");
        assert!(results[1].score > 0.0);
    }

    #[test]
    fn test_metric_missing_on_one_side_is_skipped() {
        let query = profile(&["cat", "dog", "cow"]);
        // Two words: no 3-gram histogram.
        let candidate = profile(&["ox", "yak"]);
        let weights = WeightConfig::default();

        let result = score_candidate(&query, "short", &candidate, &weights).unwrap();
        assert!(!result.distances.contains_key(&Metric::ThreeGramLengths));
        assert!(result.distances.contains_key(&Metric::TwoGramLengths));

        let one = result.distances[&Metric::OneGramLengths];
        let unique = result.distances[&Metric::UniqueLengths];
        assert!((result.score - (one + 0.25 * unique)).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_without_shared_metrics_fails() {
        let query = profile(&["cat"]);
        let empty = LanguageProfile::new(Some("eng".to_string()));
        let error = score(&query, &[("eng.json".to_string(), empty)], &WeightConfig::default())
            .unwrap_err();
        assert!(matches!(error, ScoreError::InconsistentProfile { candidate } if candidate == "eng.json"));
    }

    #[test]
    fn test_ties_break_by_candidate_id() {
        let query = profile(&["cat", "dog"]);
        let candidates = vec![
            ("b".to_string(), profile(&["pig", "hen"])),
            ("a".to_string(), profile(&["elk", "yak"])),
        ];
        let first = score(&query, &candidates, &WeightConfig::default()).unwrap();
        let second = score(&query, &candidates, &WeightConfig::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].candidate, "a");
        assert_eq!(first[1].candidate, "b");
    }

    #[test]
    fn test_same_lengths_different_words_score_zero() {
        let query = profile(&["cat", "cat", "cat"]);
        let candidate = profile(&["cat", "dog", "cow"]);
        let result = score_candidate(&query, "c", &candidate, &WeightConfig::default()).unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.distances.values().all(|d| *d == 0.0));
        assert_eq!(
            candidate
                .metric(Metric::TwoGramLengths)
                .unwrap()
                .probability(&LengthKey::bigram(3, 3)),
            1.0
        );
    }
}
