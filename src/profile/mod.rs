//! Language profiles: the persisted statistical fingerprint of one language.

mod key;
mod store;

pub use key::{KeyParseError, LengthKey};
pub use store::{ProfileError, load, save};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Current on-disk profile format version.
pub const PROFILE_VERSION: u32 = 1;

/// How far a loaded histogram's probabilities may sum away from 1.0.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// The fixed set of metrics a profile may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Metric {
    OneGramLengths,
    TwoGramLengths,
    ThreeGramLengths,
    UniqueLengths,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::OneGramLengths,
        Metric::TwoGramLengths,
        Metric::ThreeGramLengths,
        Metric::UniqueLengths,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::OneGramLengths => "1-gram lengths",
            Metric::TwoGramLengths => "2-gram lengths",
            Metric::ThreeGramLengths => "3-gram lengths",
            Metric::UniqueLengths => "unique lengths",
        }
    }

    /// Number of word lengths in each key of this metric's histogram.
    pub fn arity(self) -> usize {
        match self {
            Metric::OneGramLengths | Metric::UniqueLengths => 1,
            Metric::TwoGramLengths => 2,
            Metric::ThreeGramLengths => 3,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metric '{0}'. Valid metrics: 1-gram lengths, 2-gram lengths, 3-gram lengths, unique lengths")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

impl From<Metric> for &'static str {
    fn from(metric: Metric) -> Self {
        metric.name()
    }
}

impl TryFrom<String> for Metric {
    type Error = UnknownMetric;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A normalized distribution over word-length keys.
///
/// Only the histogram engine creates these from counts, so every instance
/// sums to 1.0. Loaded instances are checked by [`LanguageProfile::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LengthHistogram(BTreeMap<LengthKey, f64>);

impl LengthHistogram {
    pub(crate) fn from_normalized(buckets: BTreeMap<LengthKey, f64>) -> Self {
        Self(buckets)
    }

    /// Probability of a key; keys absent from the histogram have probability 0.
    pub fn probability(&self, key: &LengthKey) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LengthKey, f64)> {
        self.0.iter().map(|(key, p)| (key, *p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &LengthKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

/// The fingerprint of one language.
///
/// Built once by the histogram engine and never mutated afterwards; the
/// `with_*` methods consume the profile and are only used while assembling it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProfile {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(rename = "1-gram lengths", default, skip_serializing_if = "Option::is_none")]
    one_gram_lengths: Option<LengthHistogram>,
    #[serde(rename = "2-gram lengths", default, skip_serializing_if = "Option::is_none")]
    two_gram_lengths: Option<LengthHistogram>,
    #[serde(rename = "3-gram lengths", default, skip_serializing_if = "Option::is_none")]
    three_gram_lengths: Option<LengthHistogram>,
    #[serde(rename = "unique lengths", default, skip_serializing_if = "Option::is_none")]
    unique_lengths: Option<LengthHistogram>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<BTreeMap<String, u64>>,
}

impl LanguageProfile {
    pub fn new(language: Option<String>) -> Self {
        Self {
            version: PROFILE_VERSION,
            language,
            one_gram_lengths: None,
            two_gram_lengths: None,
            three_gram_lengths: None,
            unique_lengths: None,
            words: None,
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric, histogram: LengthHistogram) -> Self {
        *self.slot_mut(metric) = Some(histogram);
        self
    }

    #[must_use]
    pub fn with_words(mut self, words: BTreeMap<String, u64>) -> Self {
        self.words = Some(words);
        self
    }

    /// Canonical code of the language this profile describes, if known.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn metric(&self, metric: Metric) -> Option<&LengthHistogram> {
        match metric {
            Metric::OneGramLengths => self.one_gram_lengths.as_ref(),
            Metric::TwoGramLengths => self.two_gram_lengths.as_ref(),
            Metric::ThreeGramLengths => self.three_gram_lengths.as_ref(),
            Metric::UniqueLengths => self.unique_lengths.as_ref(),
        }
    }

    /// Metrics present in this profile, in canonical order.
    pub fn metrics(&self) -> impl Iterator<Item = (Metric, &LengthHistogram)> {
        Metric::ALL
            .into_iter()
            .filter_map(|metric| self.metric(metric).map(|histogram| (metric, histogram)))
    }

    /// Raw, unnormalized word frequencies, when they were retained.
    pub fn words(&self) -> Option<&BTreeMap<String, u64>> {
        self.words.as_ref()
    }

    /// Check the invariants a loaded profile must satisfy.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.version != PROFILE_VERSION {
            return Err(ProfileError::UnsupportedVersion {
                version: self.version,
            });
        }

        for (metric, histogram) in self.metrics() {
            if histogram.is_empty() {
                return Err(ProfileError::Invalid {
                    metric,
                    reason: "histogram has no buckets".to_string(),
                });
            }
            if let Some(key) = histogram.keys().find(|key| key.arity() != metric.arity()) {
                return Err(ProfileError::Invalid {
                    metric,
                    reason: format!("key '{key}' does not have {} lengths", metric.arity()),
                });
            }
            if let Some((key, p)) = histogram
                .iter()
                .find(|(_, p)| !p.is_finite() || *p < 0.0)
            {
                return Err(ProfileError::Invalid {
                    metric,
                    reason: format!("bucket '{key}' has invalid probability {p}"),
                });
            }
            let total = histogram.total();
            if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
                return Err(ProfileError::Invalid {
                    metric,
                    reason: format!("probabilities sum to {total}, expected 1.0"),
                });
            }
        }

        Ok(())
    }

    fn slot_mut(&mut self, metric: Metric) -> &mut Option<LengthHistogram> {
        match metric {
            Metric::OneGramLengths => &mut self.one_gram_lengths,
            Metric::TwoGramLengths => &mut self.two_gram_lengths,
            Metric::ThreeGramLengths => &mut self.three_gram_lengths,
            Metric::UniqueLengths => &mut self.unique_lengths,
        }
    }
}
