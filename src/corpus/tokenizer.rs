//! Tokenizers turning raw record text into word tokens.
use regex::Regex;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Runs of word characters, or runs of anything that is neither a word
/// character nor whitespace.
const WORD_PUNCT_PATTERN: &str = r"\w+|[^\w\s]+";

#[derive(Error, Debug, Clone)]
pub enum TokenizerError {
    #[error("Tokenizer pattern '{pattern}' failed to compile: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Unknown tokenizer '{0}'. Valid tokenizers: word-punct, unicode-words")]
    Unknown(String),
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits text into alphanumeric runs and punctuation runs.
///
/// `"Don't stop!"` becomes `["Don", "'", "t", "stop", "!"]`.
#[derive(Debug, Clone)]
pub struct WordPunctTokenizer {
    pattern: Regex,
}

impl WordPunctTokenizer {
    pub fn new() -> Result<Self, TokenizerError> {
        let pattern = Regex::new(WORD_PUNCT_PATTERN).map_err(|source| TokenizerError::Pattern {
            pattern: WORD_PUNCT_PATTERN.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }
}

impl Tokenizer for WordPunctTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// UAX#29 word boundaries; punctuation is dropped and contractions stay whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeWordTokenizer;

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words().map(str::to_string).collect()
    }
}

/// Build a tokenizer by name.
pub fn tokenizer_by_name(name: &str) -> Result<Box<dyn Tokenizer>, TokenizerError> {
    match name {
        "word-punct" => Ok(Box::new(WordPunctTokenizer::new()?)),
        "unicode-words" => Ok(Box::new(UnicodeWordTokenizer)),
        other => Err(TokenizerError::Unknown(other.to_string())),
    }
}

/// Trim and case-fold a token. Returns `None` for tokens that end up empty.
pub fn normalize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
