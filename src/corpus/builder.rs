//! Turns labelled corpus records into one word file per language.
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::format::{RecordError, RecordFormat, read_records};
use super::tokenizer::{Tokenizer, normalize_word};
use crate::extract::ExtractError;
use crate::language;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
    #[error("Unreadable corpus file: {0}")]
    Record(#[source] RecordError),
    #[error("IO error writing word file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counters of one corpus build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub files: usize,
    pub records_read: u64,
    pub records_kept: u64,
    pub unknown_language: u64,
    pub malformed: u64,
    /// Words written per canonical language code.
    pub words: BTreeMap<String, u64>,
}

impl BuildReport {
    pub fn languages(&self) -> usize {
        self.words.len()
    }

    pub fn total_words(&self) -> u64 {
        self.words.values().sum()
    }
}

/// Open word files of one corpus, keyed by canonical language code.
///
/// Files are opened in append mode on first use. `finish` flushes and closes
/// them; on any other exit path `Drop` flushes what it can.
#[derive(Debug)]
pub struct LanguageFiles {
    dir: PathBuf,
    handles: FxHashMap<String, BufWriter<File>>,
}

impl LanguageFiles {
    pub fn new(dir: &Path) -> Result<Self, BuildError> {
        fs::create_dir_all(dir).map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            handles: FxHashMap::default(),
        })
    }

    pub fn writer(&mut self, code: &str) -> Result<&mut BufWriter<File>, BuildError> {
        if !self.handles.contains_key(code) {
            let path = self.dir.join(code);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| BuildError::Io { path, source })?;
            tracing::debug!(language = code, dir = %self.dir.display(), "Opened word file");
            self.handles.insert(code.to_string(), BufWriter::new(file));
        }
        self.handles
            .get_mut(code)
            .ok_or_else(|| BuildError::Io {
                path: self.dir.join(code),
                source: std::io::Error::other("word file handle vanished"),
            })
    }

    pub fn write_word(&mut self, code: &str, word: &str) -> Result<(), BuildError> {
        let writer = self.writer(code)?;
        writeln!(writer, "{word}").map_err(|source| BuildError::Io {
            path: self.dir.join(code),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Flush and close every handle, reporting the first failure.
    pub fn finish(mut self) -> Result<(), BuildError> {
        let mut handles: Vec<_> = std::mem::take(&mut self.handles).into_iter().collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));
        for (code, mut writer) in handles {
            writer.flush().map_err(|source| BuildError::Io {
                path: self.dir.join(&code),
                source,
            })?;
        }
        Ok(())
    }
}

impl Drop for LanguageFiles {
    fn drop(&mut self) {
        for (code, writer) in &mut self.handles {
            if let Err(e) = writer.flush() {
                tracing::warn!(language = %code, error = %e, "Failed to flush word file");
            }
        }
    }
}

/// Write the words of every record in `files` to per-language word files
/// under `out_dir`.
///
/// Records with an unresolvable language or a malformed line are skipped and
/// counted. Extraction errors and unreadable files abort the build.
pub fn build<I>(
    files: I,
    format: &dyn RecordFormat,
    tokenizer: &dyn Tokenizer,
    out_dir: &Path,
) -> Result<BuildReport, BuildError>
where
    I: IntoIterator<Item = Result<PathBuf, ExtractError>>,
{
    let mut outputs = LanguageFiles::new(out_dir)?;
    let mut report = BuildReport::default();
    // Raw code -> canonical code, or None when unresolvable.
    let mut resolved: FxHashMap<String, Option<String>> = FxHashMap::default();

    for file in files {
        let file = file?;
        report.files += 1;
        tracing::info!(file = %file.display(), format = format.name(), "Reading corpus file");

        for record in read_records(format, &file).map_err(BuildError::Record)? {
            report.records_read += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(error = %e, "Dropping malformed record");
                    report.malformed += 1;
                    continue;
                }
                Err(e) => return Err(BuildError::Record(e)),
            };

            let code = resolved
                .entry(record.language_code.clone())
                .or_insert_with(|| canonical(&record.language_code));
            let Some(code) = code.as_deref() else {
                tracing::debug!(code = %record.language_code, "Dropping sentence in unknown language");
                report.unknown_language += 1;
                continue;
            };

            let mut written = 0;
            for token in tokenizer.tokenize(&record.text) {
                if let Some(word) = normalize_word(&token) {
                    outputs.write_word(code, &word)?;
                    written += 1;
                }
            }
            *report.words.entry(code.to_string()).or_default() += written;
            report.records_kept += 1;
        }
    }

    outputs.finish()?;
    tracing::info!(
        files = report.files,
        records = report.records_read,
        kept = report.records_kept,
        unknown_language = report.unknown_language,
        malformed = report.malformed,
        languages = report.languages(),
        "Corpus build finished"
    );
    Ok(report)
}

fn canonical(code: &str) -> Option<String> {
    match language::resolve(code) {
        Ok(identity) => identity.canonical_code().ok().map(str::to_string),
        Err(e) => {
            tracing::debug!(code, error = %e, "Unresolvable language code");
            None
        }
    }
}
