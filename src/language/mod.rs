//! Language code resolution.
//!
//! Corpora label records with whatever coding scheme their maintainers
//! picked: modern ISO 639-3 codes, codes ISO has since retired, or two-letter
//! ISO 639-1 codes. Everything is folded onto one `LanguageIdentity` so a
//! language gets exactly one word file and one profile.

mod retired;

use isolang::Language;
use thiserror::Error;

use crate::domain::LanguageIdentity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Unknown language code '{0}'")]
    Unknown(String),
    /// Raised only when the language table hands out an identity without any
    /// code, which is a defect in the table rather than bad input.
    #[error("Language '{name}' has neither a 3-letter nor a 2-letter code")]
    CodeResolution { name: String },
}

/// Which step of the fallback chain produced an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// Modern ISO 639-3 code
    Alpha3,
    /// Retired ISO 639-3 code, replaced by its successor
    Retired,
    /// ISO 639-1 code
    Alpha2,
}

/// Resolve a language code to its canonical identity.
///
/// The chain is tried in order and the first hit wins: modern 3-letter code,
/// retired 3-letter code mapped to its replacement, 2-letter code.
pub fn resolve(code: &str) -> Result<LanguageIdentity, LanguageError> {
    resolve_with_source(code).map(|(identity, _)| identity)
}

/// Same as [`resolve`], also reporting which step matched.
pub fn resolve_with_source(code: &str) -> Result<(LanguageIdentity, ResolvedVia), LanguageError> {
    let normalized = code.trim().to_ascii_lowercase();

    if normalized.len() == 3 {
        if let Some(language) = Language::from_639_3(&normalized) {
            return Ok((identity_of(language), ResolvedVia::Alpha3));
        }

        if let Some(language) = retired::replacement(&normalized).and_then(Language::from_639_3) {
            tracing::trace!(
                code = %normalized,
                replacement = language.to_639_3(),
                "Resolved retired language code"
            );
            return Ok((identity_of(language), ResolvedVia::Retired));
        }
    }

    if normalized.len() == 2
        && let Some(language) = Language::from_639_1(&normalized)
    {
        return Ok((identity_of(language), ResolvedVia::Alpha2));
    }

    Err(LanguageError::Unknown(code.to_string()))
}

/// The canonical code of an identity: 3-letter form, else 2-letter form.
pub fn canonical_code(identity: &LanguageIdentity) -> Result<&str, LanguageError> {
    identity.canonical_code()
}

fn identity_of(language: Language) -> LanguageIdentity {
    LanguageIdentity::new(
        Some(language.to_639_3()),
        language.to_639_1(),
        language.to_name(),
    )
}
