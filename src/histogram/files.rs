use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::{HistogramAccumulator, HistogramError, HistogramOptions, WordStream};
use crate::corpus::hyphenation::Hyphenator;
use crate::domain::LanguageIdentity;
use crate::language;
use crate::profile::LanguageProfile;

/// Build the profile of one per-language word file.
///
/// The file name is the language code; it is resolved so the profile carries
/// the canonical code. With a hyphenator, every word is split into syllables
/// and the syllables are counted instead of the words.
pub fn histogram_file(
    path: &Path,
    keep_words: bool,
    hyphenator: Option<&Hyphenator>,
) -> Result<LanguageProfile, HistogramError> {
    let language = language_of(path)?;
    let options = HistogramOptions {
        keep_words,
        language: Some(language),
    };

    let mut accumulator = HistogramAccumulator::new();
    for word in WordStream::open(path)? {
        let word = word.map_err(|source| HistogramError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match hyphenator {
            Some(hyphenator) => {
                for syllable in hyphenator.syllables(&word) {
                    accumulator.push(&syllable);
                }
            }
            None => accumulator.push(&word),
        }
    }

    tracing::debug!(
        path = %path.display(),
        words = accumulator.total_words(),
        distinct = accumulator.distinct_words(),
        "Counted word stream"
    );

    accumulator
        .finish(&options)
        .map_err(|source| HistogramError::InFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}

/// Build profiles for several word files in parallel.
///
/// Results come back in input order; one failing file does not affect the
/// others. When `hyphenation_dir` is set, each file is split into syllables
/// with the pattern file installed there for its language.
pub fn histogram_files(
    paths: &[PathBuf],
    keep_words: bool,
    hyphenation_dir: Option<&Path>,
) -> Vec<(PathBuf, Result<LanguageProfile, HistogramError>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = match hyphenation_dir {
                Some(dir) => syllable_histogram(path, keep_words, dir),
                None => histogram_file(path, keep_words, None),
            };
            (path.clone(), result)
        })
        .collect()
}

fn syllable_histogram(
    path: &Path,
    keep_words: bool,
    hyphenation_dir: &Path,
) -> Result<LanguageProfile, HistogramError> {
    let identity = identity_of(path)?;
    let hyphenator = Hyphenator::for_language(hyphenation_dir, &identity)?;
    histogram_file(path, keep_words, Some(&hyphenator))
}

fn identity_of(path: &Path) -> Result<LanguageIdentity, HistogramError> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    language::resolve(&stem).map_err(|source| HistogramError::Language {
        path: path.to_path_buf(),
        source,
    })
}

fn language_of(path: &Path) -> Result<String, HistogramError> {
    let identity = identity_of(path)?;
    identity
        .canonical_code()
        .map(str::to_string)
        .map_err(|source| HistogramError::Language {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{LengthKey, Metric};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_histogram_file_stamps_canonical_language() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("en");
        fs::write(&path, "cat\ndog\n\nCOW\n").unwrap();

        let profile = histogram_file(&path, true, None).unwrap();
        assert_eq!(profile.language(), Some("eng"));
        assert_eq!(profile.words().unwrap()["cow"], 1);
        assert_eq!(
            profile
                .metric(Metric::TwoGramLengths)
                .unwrap()
                .probability(&LengthKey::bigram(3, 3)),
            1.0
        );
    }

    #[test]
    fn test_empty_word_file_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fra");
        fs::write(&path, "\n  \n").unwrap();

        let error = histogram_file(&path, false, None).unwrap_err();
        assert!(matches!(error, HistogramError::InFile { .. }));
        assert!(error.to_string().contains("fra"));
    }

    #[test]
    fn test_unknown_language_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notalanguage");
        fs::write(&path, "word\n").unwrap();

        assert!(matches!(
            histogram_file(&path, false, None),
            Err(HistogramError::Language { .. })
        ));
    }

    #[test]
    fn test_histogram_files_keeps_order_and_isolates_failures() {
        let temp_dir = TempDir::new().unwrap();
        let deu = temp_dir.path().join("deu");
        let missing = temp_dir.path().join("spa");
        let ita = temp_dir.path().join("ita");
        fs::write(&deu, "der\nhund\n").unwrap();
        fs::write(&ita, "il\ncane\n").unwrap();

        let results = histogram_files(&[deu.clone(), missing.clone(), ita.clone()], false, None);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, deu);
        assert_eq!(results[0].1.as_ref().unwrap().language(), Some("deu"));
        assert!(matches!(results[1].1, Err(HistogramError::NotFound(_))));
        assert_eq!(results[2].1.as_ref().unwrap().language(), Some("ita"));
    }
}
