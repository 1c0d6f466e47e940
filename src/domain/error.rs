use thiserror::Error;

use crate::corpus::CorpusError;
use crate::corpus::tokenizer::TokenizerError;
use crate::extract::ExtractError;
use crate::histogram::HistogramError;
use crate::language::LanguageError;
use crate::profile::ProfileError;
use crate::similarity::ScoreError;

/// Top-level error type for the langprint pipeline.
#[derive(Error, Debug)]
pub enum LangprintError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Language error: {0}")]
    Language(#[from] LanguageError),

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("Histogram error: {0}")]
    Histogram(#[from] HistogramError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Scoring error: {0}")]
    Score(#[from] ScoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
