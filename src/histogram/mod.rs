//! Streaming histogram engine.
//!
//! One forward pass over a word stream feeds four length histograms and the
//! raw word-frequency map; normalization happens once, when the pass is done.

mod files;
mod stream;

pub use files::{histogram_file, histogram_files};
pub use stream::WordStream;

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::corpus::hyphenation::HyphenationError;
use crate::language::LanguageError;
use crate::profile::{LanguageProfile, LengthHistogram, LengthKey, Metric};

#[derive(Error, Debug)]
pub enum HistogramError {
    /// Normalizing a histogram with no counts would divide by zero.
    #[error("Cannot normalize empty '{metric}' histogram")]
    EmptyInput { metric: Metric },
    #[error("Word file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot determine language of {}: {source}", path.display())]
    Language {
        path: PathBuf,
        #[source]
        source: LanguageError,
    },
    #[error("Syllable splitting unavailable: {0}")]
    Hyphenation(#[from] HyphenationError),
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<HistogramError>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct HistogramOptions {
    /// Retain the raw word-frequency map in the profile.
    pub keep_words: bool,
    /// Canonical code stamped on the resulting profile.
    pub language: Option<String>,
}

/// Accumulates raw counts over a word stream.
#[derive(Debug, Default)]
pub struct HistogramAccumulator {
    words: FxHashMap<String, u64>,
    one_gram: FxHashMap<LengthKey, u64>,
    two_gram: FxHashMap<LengthKey, u64>,
    three_gram: FxHashMap<LengthKey, u64>,
    unique: FxHashMap<LengthKey, u64>,
    previous: Option<u32>,
    before_previous: Option<u32>,
    total_words: u64,
}

impl HistogramAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, word: &str) {
        let length = u32::try_from(word.chars().count()).unwrap_or(u32::MAX);

        let first_occurrence = match self.words.get_mut(word) {
            Some(count) => {
                *count += 1;
                false
            }
            None => {
                self.words.insert(word.to_string(), 1);
                true
            }
        };

        *self.one_gram.entry(LengthKey::unigram(length)).or_insert(0) += 1;

        if first_occurrence {
            *self.unique.entry(LengthKey::unigram(length)).or_insert(0) += 1;
        }

        if let Some(previous) = self.previous {
            *self
                .two_gram
                .entry(LengthKey::bigram(previous, length))
                .or_insert(0) += 1;

            if let Some(before_previous) = self.before_previous {
                *self
                    .three_gram
                    .entry(LengthKey::trigram(before_previous, previous, length))
                    .or_insert(0) += 1;
            }
        }

        self.before_previous = self.previous;
        self.previous = Some(length);
        self.total_words += 1;
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    pub fn distinct_words(&self) -> usize {
        self.words.len()
    }

    /// Raw counts of one metric.
    pub fn counts(&self, metric: Metric) -> &FxHashMap<LengthKey, u64> {
        match metric {
            Metric::OneGramLengths => &self.one_gram,
            Metric::TwoGramLengths => &self.two_gram,
            Metric::ThreeGramLengths => &self.three_gram,
            Metric::UniqueLengths => &self.unique,
        }
    }

    /// Total count of one metric.
    pub fn total(&self, metric: Metric) -> u64 {
        self.counts(metric).values().sum()
    }

    /// Normalize every histogram and assemble the profile.
    ///
    /// An empty stream fails with `EmptyInput`. Streams too short to produce
    /// any 2-gram or 3-gram leave those metrics absent from the profile.
    pub fn finish(self, options: &HistogramOptions) -> Result<LanguageProfile, HistogramError> {
        if self.total_words == 0 {
            return Err(HistogramError::EmptyInput {
                metric: Metric::OneGramLengths,
            });
        }

        let mut profile = LanguageProfile::new(options.language.clone())
            .with_metric(Metric::OneGramLengths, normalize(Metric::OneGramLengths, self.one_gram)?)
            .with_metric(Metric::UniqueLengths, normalize(Metric::UniqueLengths, self.unique)?);

        for (metric, counts) in [
            (Metric::TwoGramLengths, self.two_gram),
            (Metric::ThreeGramLengths, self.three_gram),
        ] {
            if counts.is_empty() {
                tracing::debug!(
                    metric = %metric,
                    words = self.total_words,
                    language = ?options.language,
                    "Too few words for metric, leaving it out of the profile"
                );
                continue;
            }
            profile = profile.with_metric(metric, normalize(metric, counts)?);
        }

        if options.keep_words {
            profile = profile.with_words(self.words.into_iter().collect::<BTreeMap<_, _>>());
        }

        Ok(profile)
    }
}

/// Turn raw counts into probabilities by dividing by their total.
pub fn normalize<I>(metric: Metric, counts: I) -> Result<LengthHistogram, HistogramError>
where
    I: IntoIterator<Item = (LengthKey, u64)>,
{
    let counts: Vec<(LengthKey, u64)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
    let total: u64 = counts.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Err(HistogramError::EmptyInput { metric });
    }

    let total = total as f64;
    Ok(LengthHistogram::from_normalized(
        counts
            .into_iter()
            .map(|(key, count)| (key, count as f64 / total))
            .collect(),
    ))
}

/// Build a profile from an in-memory word sequence.
pub fn histogram<I, S>(words: I, options: &HistogramOptions) -> Result<LanguageProfile, HistogramError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut accumulator = HistogramAccumulator::new();
    for word in words {
        accumulator.push(word.as_ref());
    }
    accumulator.finish(options)
}
