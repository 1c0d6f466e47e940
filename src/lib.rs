#![warn(rust_2018_idioms)]
// Pedantic lints enforced individually:
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Pedantic lints that do not fit this crate:
#![allow(
    clippy::cast_precision_loss,      // Counts stay far below 2^52
    clippy::missing_errors_doc,       // Error enums document themselves
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. CorpusError in corpus module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Metric names read better unquoted
)]

pub mod app;
pub mod corpus;
pub mod domain;
pub mod extract;
pub mod histogram;
pub mod language;
pub mod profile;
pub mod similarity;

// Types most callers need
pub use app::{App, Config};
pub use domain::{LangprintError, LanguageIdentity};
pub use histogram::{HistogramOptions, histogram};
pub use profile::{LanguageProfile, LengthHistogram, LengthKey, Metric};
pub use similarity::{ScoreResult, WeightConfig, score};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
