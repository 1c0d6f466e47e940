//! Domain layer for langprint.
//!
//! Contains the canonical types shared across all modules:
//! - `LanguageIdentity`: The resolved language a word stream or profile belongs to
//! - `LangprintError`: Top-level error type

pub mod error;
pub mod language;

pub use error::LangprintError;
pub use language::LanguageIdentity;
