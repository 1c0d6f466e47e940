use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An ordered tuple of one to three word lengths.
///
/// Encoded as text by joining the lengths with `,`: `"3"`, `"3,4"`, `"3,4,5"`.
/// Ordering is numeric and lexicographic, so persisted histograms list `2`
/// before `10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LengthKey(SmallVec<[u32; 3]>);

impl LengthKey {
    pub const MAX_ARITY: usize = 3;

    pub fn unigram(length: u32) -> Self {
        Self(SmallVec::from_slice(&[length]))
    }

    pub fn bigram(first: u32, second: u32) -> Self {
        Self(SmallVec::from_slice(&[first, second]))
    }

    pub fn trigram(first: u32, second: u32, third: u32) -> Self {
        Self(SmallVec::from_slice(&[first, second, third]))
    }

    pub fn lengths(&self) -> &[u32] {
        &self.0
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for LengthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, length) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{length}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("Empty length key")]
    Empty,
    #[error("Length key '{key}' has {arity} parts, at most 3 are allowed")]
    TooLong { key: String, arity: usize },
    #[error("Invalid length '{part}' in key '{key}'")]
    InvalidLength { key: String, part: String },
}

impl FromStr for LengthKey {
    type Err = KeyParseError;

    /// Parses the canonical `"3,4"` form. A surrounding tuple notation such as
    /// `"(3, 4)"` is accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if inner.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut lengths = SmallVec::new();
        for part in inner.split(',').map(str::trim) {
            let length = part.parse::<u32>().map_err(|_| KeyParseError::InvalidLength {
                key: s.to_string(),
                part: part.to_string(),
            })?;
            lengths.push(length);
        }

        if lengths.len() > Self::MAX_ARITY {
            return Err(KeyParseError::TooLong {
                key: s.to_string(),
                arity: lengths.len(),
            });
        }

        Ok(Self(lengths))
    }
}

impl From<LengthKey> for String {
    fn from(key: LengthKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for LengthKey {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
