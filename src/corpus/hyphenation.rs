//! Syllable splitting with Liang hyphenation patterns.
//!
//! Patterns come from an installed resource file per language, either a TeX
//! pattern file (`hyph-de.pat.txt`, `deu.pat`) or a LibreOffice dictionary
//! (`hyph_de.dic`).

use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::LanguageIdentity;

const DEFAULT_LEFT_MIN: usize = 2;
const DEFAULT_RIGHT_MIN: usize = 3;

#[derive(Error, Debug)]
pub enum HyphenationError {
    #[error("No hyphenation patterns for {language} installed in {}", dir.display())]
    NotFound { language: String, dir: PathBuf },
    #[error("IO error reading hyphenation patterns {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Hyphenation resource {} contains no patterns", path.display())]
    NoPatterns { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Hyphenator {
    patterns: FxHashMap<String, Vec<u8>>,
    max_pattern_len: usize,
    left_min: usize,
    right_min: usize,
}

impl Hyphenator {
    /// Load the pattern file installed in `dir` for a language.
    pub fn for_language(dir: &Path, language: &LanguageIdentity) -> Result<Self, HyphenationError> {
        let mut candidates = Vec::new();
        if let Some(alpha2) = language.alpha2() {
            candidates.push(format!("hyph_{alpha2}.dic"));
            candidates.push(format!("hyph-{alpha2}.pat.txt"));
        }
        if let Some(alpha3) = language.alpha3() {
            candidates.push(format!("hyph_{alpha3}.dic"));
            candidates.push(format!("{alpha3}.pat"));
        }

        let path = candidates
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| HyphenationError::NotFound {
                language: language.to_string(),
                dir: dir.to_path_buf(),
            })?;

        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, HyphenationError> {
        let bytes = fs::read(path).map_err(|source| HyphenationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        // LibreOffice dictionaries start with a charset line.
        let body = if path.extension().is_some_and(|ext| ext == "dic") {
            text.split_once('\n').map_or("", |(_, rest)| rest)
        } else {
            &text
        };

        let hyphenator = Self::from_patterns(body, DEFAULT_LEFT_MIN, DEFAULT_RIGHT_MIN);
        if hyphenator.patterns.is_empty() {
            return Err(HyphenationError::NoPatterns {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(
            path = %path.display(),
            patterns = hyphenator.patterns.len(),
            "Loaded hyphenation patterns"
        );
        Ok(hyphenator)
    }

    /// Parse whitespace-separated Liang patterns.
    ///
    /// `%` and `#` start comments, `\patterns{`/`}` wrappers are ignored, and
    /// `LEFTHYPHENMIN`/`RIGHTHYPHENMIN` directives override the given minimums.
    /// Non-standard patterns (containing `/`) are skipped.
    pub fn from_patterns(text: &str, left_min: usize, right_min: usize) -> Self {
        let mut hyphenator = Self {
            patterns: FxHashMap::default(),
            max_pattern_len: 0,
            left_min,
            right_min,
        };

        for line in text.lines() {
            let line = line.split(['%', '#']).next().unwrap_or("").trim();
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("LEFTHYPHENMIN") => {
                    if let Some(value) = tokens.next().and_then(|v| v.parse().ok()) {
                        hyphenator.left_min = value;
                    }
                    continue;
                }
                Some("RIGHTHYPHENMIN") => {
                    if let Some(value) = tokens.next().and_then(|v| v.parse().ok()) {
                        hyphenator.right_min = value;
                    }
                    continue;
                }
                _ => {}
            }

            for token in line.split_whitespace() {
                let token = token.trim_start_matches("\\patterns{").trim_end_matches('}');
                if token.is_empty() || token.contains('/') || token.starts_with('\\') {
                    continue;
                }
                if token.chars().all(|c| c.is_ascii_uppercase() || c == '-' || c == '_') {
                    continue;
                }
                hyphenator.insert_pattern(token);
            }
        }

        // Every syllable keeps at least one letter.
        hyphenator.left_min = hyphenator.left_min.max(1);
        hyphenator.right_min = hyphenator.right_min.max(1);
        hyphenator
    }

    fn insert_pattern(&mut self, pattern: &str) {
        let mut letters = String::new();
        let mut values = vec![0u8];
        for c in pattern.chars() {
            if let Some(digit) = c.to_digit(10) {
                if let Some(last) = values.last_mut() {
                    *last = digit as u8;
                }
            } else {
                letters.extend(c.to_lowercase());
                values.push(0);
            }
        }

        let len = letters.chars().count();
        if len == 0 {
            return;
        }
        self.max_pattern_len = self.max_pattern_len.max(len);
        self.patterns.insert(letters, values);
    }

    /// Split a word into syllables at its odd-valued hyphenation points.
    pub fn syllables(&self, word: &str) -> Vec<String> {
        let letters: Vec<char> = word.chars().collect();
        let n = letters.len();
        if n < self.left_min + self.right_min || n == 0 {
            return vec![word.to_string()];
        }

        let padded: Vec<char> = std::iter::once('.')
            .chain(letters.iter().flat_map(|c| c.to_lowercase()))
            .chain(std::iter::once('.'))
            .collect();
        if padded.len() != n + 2 {
            // Lowercasing changed the length; positions no longer line up.
            return vec![word.to_string()];
        }

        let mut points = vec![0u8; padded.len() + 1];
        for start in 0..padded.len() {
            let end_max = padded.len().min(start + self.max_pattern_len);
            for end in start + 1..=end_max {
                let fragment: String = padded[start..end].iter().collect();
                if let Some(values) = self.patterns.get(&fragment) {
                    for (offset, value) in values.iter().enumerate() {
                        let point = &mut points[start + offset];
                        *point = (*point).max(*value);
                    }
                }
            }
        }

        let mut syllables = Vec::new();
        let mut current = String::new();
        for (index, c) in letters.iter().enumerate() {
            if index >= self.left_min && index <= n - self.right_min && points[index + 1] % 2 == 1 {
                syllables.push(std::mem::take(&mut current));
            }
            current.push(*c);
        }
        syllables.push(current);
        syllables
    }
}
