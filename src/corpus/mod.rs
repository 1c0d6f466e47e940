//! Supported corpora and their acquisition: download, extraction and the
//! per-language word file build.

pub mod builder;
pub mod fetch;
pub mod format;
pub mod hyphenation;
pub mod tokenizer;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use url::Url;

use crate::extract::{self, ExtractOptions};
use builder::{BuildError, BuildReport};
use fetch::{FetchError, FetchOutcome, Fetcher};
use format::{RecordFormat, TatoebaFormat};
use tokenizer::TokenizerError;

pub const COMPLETE_MARKER: &str = ".complete";
const DATA_DIR: &str = "data";

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Tried '{name}'. Only following corpora are supported: {supported}")]
    Unsupported { name: String, supported: String },
    #[error("Invalid download URL for {corpus}: {source}")]
    InvalidUrl {
        corpus: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Download of {corpus} failed: {source}")]
    Fetch {
        corpus: String,
        #[source]
        source: FetchError,
    },
    #[error("Archive of {corpus} not downloaded yet: {}", path.display())]
    MissingArchive { corpus: String, path: PathBuf },
    #[error("Building {corpus} failed: {source}")]
    Build {
        corpus: String,
        #[source]
        source: BuildError,
    },
    #[error("Tokenizer for {corpus} unavailable: {source}")]
    Tokenizer {
        corpus: String,
        #[source]
        source: TokenizerError,
    },
    #[error("IO error for {corpus} at {}: {source}", path.display())]
    Io {
        corpus: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot record completion of {corpus}: {source}")]
    Marker {
        corpus: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Worker for {corpus} did not finish: {reason}")]
    Worker { corpus: String, reason: String },
}

/// Where a corpus comes from and how its records are read.
#[derive(Clone)]
pub struct CorpusSource {
    pub name: String,
    pub url: String,
    pub archive_name: String,
    /// File name of the record file inside the (possibly nested) archive.
    pub target_file: String,
    pub format: Arc<dyn RecordFormat>,
    pub tokenizer: String,
}

impl fmt::Debug for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorpusSource")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("archive_name", &self.archive_name)
            .field("target_file", &self.target_file)
            .field("format", &self.format.name())
            .field("tokenizer", &self.tokenizer)
            .finish()
    }
}

impl CorpusSource {
    pub fn tatoeba() -> Self {
        Self {
            name: "tatoeba".to_string(),
            url: "https://downloads.tatoeba.org/exports/sentences.tar.bz2".to_string(),
            archive_name: "sentences.tar.bz2".to_string(),
            target_file: "sentences.csv".to_string(),
            format: Arc::new(TatoebaFormat),
            tokenizer: "word-punct".to_string(),
        }
    }
}

/// Registry of supported corpora.
#[derive(Debug, Clone)]
pub struct Corpora {
    sources: Vec<CorpusSource>,
}

impl Default for Corpora {
    fn default() -> Self {
        Self::new(vec![CorpusSource::tatoeba()])
    }
}

impl Corpora {
    pub fn new(sources: Vec<CorpusSource>) -> Self {
        Self { sources }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusSource> {
        self.sources.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|source| source.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&CorpusSource, CorpusError> {
        self.sources
            .iter()
            .find(|source| source.name == name)
            .ok_or_else(|| CorpusError::Unsupported {
                name: name.to_string(),
                supported: self
                    .names()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Resolve a command-line selection: a corpus name or `all`.
    pub fn select(&self, selection: &str) -> Result<Vec<CorpusSource>, CorpusError> {
        if selection == "all" {
            Ok(self.sources.clone())
        } else {
            Ok(vec![self.get(selection)?.clone()])
        }
    }
}

/// On-disk layout of downloaded archives and built word files.
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    root: PathBuf,
}

impl CorpusLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn archive_path(&self, source: &CorpusSource) -> PathBuf {
        self.root.join(&source.name).join(&source.archive_name)
    }

    pub fn data_dir(&self, source: &CorpusSource) -> PathBuf {
        self.root.join(DATA_DIR).join(&source.name)
    }

    pub fn marker(&self, source: &CorpusSource) -> PathBuf {
        self.data_dir(source).join(COMPLETE_MARKER)
    }

    pub fn is_complete(&self, source: &CorpusSource) -> bool {
        self.marker(source).is_file()
    }
}

/// Word files of a built data directory, sorted by name. Hidden files such
/// as the completion marker are skipped.
pub fn word_files(data_dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A completion marker was found; nothing was rebuilt.
    AlreadyComplete,
    Built(BuildReport),
}

pub async fn download<F: Fetcher>(
    fetcher: &F,
    layout: &CorpusLayout,
    source: &CorpusSource,
    overwrite: bool,
) -> Result<FetchOutcome, CorpusError> {
    let url = Url::parse(&source.url).map_err(|e| CorpusError::InvalidUrl {
        corpus: source.name.clone(),
        source: e,
    })?;
    let destination = layout.archive_path(source);
    fetcher
        .fetch(&url, &destination, overwrite)
        .await
        .map_err(|e| CorpusError::Fetch {
            corpus: source.name.clone(),
            source: e,
        })
}

/// Build the word files of a downloaded corpus.
///
/// A completed build is skipped unless `force` is set. An incomplete output
/// directory is removed and rebuilt from scratch.
pub fn build(
    layout: &CorpusLayout,
    source: &CorpusSource,
    extract_options: &ExtractOptions,
    force: bool,
) -> Result<BuildOutcome, CorpusError> {
    let corpus = source.name.clone();
    if !force && layout.is_complete(source) {
        tracing::info!(corpus = %corpus, "Corpus already built, skipping");
        return Ok(BuildOutcome::AlreadyComplete);
    }

    let archive = layout.archive_path(source);
    if !archive.is_file() {
        return Err(CorpusError::MissingArchive {
            corpus,
            path: archive,
        });
    }

    let io_error = |path: &Path, source: std::io::Error| CorpusError::Io {
        corpus: corpus.clone(),
        path: path.to_path_buf(),
        source,
    };

    let data_dir = layout.data_dir(source);
    if data_dir.exists() {
        tracing::info!(corpus = %corpus, dir = %data_dir.display(), "Removing previous output");
        fs::remove_dir_all(&data_dir).map_err(|e| io_error(&data_dir, e))?;
    }

    let tokenizer = tokenizer::tokenizer_by_name(&source.tokenizer).map_err(|e| CorpusError::Tokenizer {
        corpus: corpus.clone(),
        source: e,
    })?;

    tracing::info!(corpus = %corpus, archive = %archive.display(), "Preprocessing corpus");
    let files = extract::extract(
        &archive,
        extract::file_named(&source.target_file),
        extract_options.clone(),
    );
    let report = builder::build(files, source.format.as_ref(), tokenizer.as_ref(), &data_dir).map_err(
        |e| CorpusError::Build {
            corpus: corpus.clone(),
            source: e,
        },
    )?;

    let marker = layout.marker(source);
    let summary = serde_json::to_vec_pretty(&report).map_err(|e| CorpusError::Marker {
        corpus: corpus.clone(),
        source: e,
    })?;
    fs::write(&marker, summary).map_err(|e| io_error(&marker, e))?;

    Ok(BuildOutcome::Built(report))
}

/// Download every selected corpus concurrently. Failures are reported per
/// corpus.
pub async fn download_all<F>(
    fetcher: &F,
    layout: &CorpusLayout,
    sources: &[CorpusSource],
    overwrite: bool,
) -> BTreeMap<String, Result<FetchOutcome, CorpusError>>
where
    F: Fetcher + Clone + 'static,
{
    let mut workers = JoinSet::new();
    for source in sources.iter().cloned() {
        let fetcher = fetcher.clone();
        let layout = layout.clone();
        workers.spawn(async move {
            let result = download(&fetcher, &layout, &source, overwrite).await;
            (source.name, result)
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((name, result)) => {
                results.insert(name, result);
            }
            Err(e) => tracing::error!(error = %e, "Download worker failed"),
        }
    }
    fill_missing(&mut results, sources);
    results
}

/// Download (when missing) and build every selected corpus. Completed
/// corpora are skipped before any download unless `force` is set.
///
/// Each build runs on its own blocking worker with its own scratch and
/// output directories; one failing corpus never aborts the others.
pub async fn acquire_all<F>(
    fetcher: &F,
    layout: &CorpusLayout,
    sources: &[CorpusSource],
    extract_options: &ExtractOptions,
    force: bool,
) -> BTreeMap<String, Result<BuildOutcome, CorpusError>>
where
    F: Fetcher + Clone + 'static,
{
    let mut results = BTreeMap::new();
    let mut pending = Vec::new();
    for source in sources {
        if !force && layout.is_complete(source) {
            tracing::info!(corpus = %source.name, "Corpus already built, skipping");
            results.insert(source.name.clone(), Ok(BuildOutcome::AlreadyComplete));
        } else {
            pending.push(source.clone());
        }
    }

    let mut ready = Vec::new();
    for (name, downloaded) in download_all(fetcher, layout, &pending, false).await {
        match downloaded {
            Ok(_) => ready.extend(pending.iter().filter(|source| source.name == name).cloned()),
            Err(e) => {
                results.insert(name, Err(e));
            }
        }
    }

    let mut workers = JoinSet::new();
    for source in ready {
        let layout = layout.clone();
        let extract_options = extract_options.clone();
        workers.spawn_blocking(move || {
            let span = tracing::info_span!("corpus", name = %source.name);
            let _guard = span.enter();
            let result = build(&layout, &source, &extract_options, force);
            (source.name, result)
        });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((name, result)) => {
                match &result {
                    Ok(BuildOutcome::Built(report)) => tracing::info!(
                        corpus = %name,
                        languages = report.languages(),
                        words = report.total_words(),
                        "Corpus ready"
                    ),
                    Ok(BuildOutcome::AlreadyComplete) => {}
                    Err(e) => tracing::error!(corpus = %name, error = %e, "Corpus failed"),
                }
                results.insert(name, result);
            }
            Err(e) => tracing::error!(error = %e, "Corpus worker failed"),
        }
    }
    fill_missing(&mut results, sources);
    results
}

/// Workers that panicked or were cancelled left no result behind.
fn fill_missing<T>(results: &mut BTreeMap<String, Result<T, CorpusError>>, sources: &[CorpusSource]) {
    for source in sources {
        results.entry(source.name.clone()).or_insert_with(|| {
            Err(CorpusError::Worker {
                corpus: source.name.clone(),
                reason: "worker panicked or was cancelled".to_string(),
            })
        });
    }
}
