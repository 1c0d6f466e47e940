//! Record formats of supported corpora.
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One labelled sentence read from a corpus file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub language_code: String,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed record at {}:{line}: {reason}", file.display())]
    Malformed {
        file: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("IO error reading corpus file {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    /// Malformed records are skipped; everything else aborts the corpus.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

pub trait RecordFormat: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Parse a single non-blank line into a record.
    fn parse_line(&self, line: &str) -> Result<Record, String>;
}

/// Open a corpus file and parse it line by line with `format`.
pub fn read_records<'a>(format: &'a dyn RecordFormat, path: &Path) -> Result<Records<'a>, RecordError> {
    let file = File::open(path).map_err(|source| RecordError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(Records {
        format,
        file: path.to_path_buf(),
        reader: BufReader::new(file),
        buffer: Vec::new(),
        line: 0,
    })
}

/// Lazily parsed records of one corpus file.
pub struct Records<'a> {
    format: &'a dyn RecordFormat,
    file: PathBuf,
    reader: BufReader<File>,
    buffer: Vec<u8>,
    line: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Record, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(RecordError::Io {
                        file: self.file.clone(),
                        source,
                    }));
                }
            }
            self.line += 1;

            // Bad bytes spoil one record, not the file.
            let Ok(line) = std::str::from_utf8(&self.buffer) else {
                return Some(Err(RecordError::Malformed {
                    file: self.file.clone(),
                    line: self.line,
                    reason: "invalid UTF-8".to_string(),
                }));
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.format.parse_line(line).map_err(|reason| {
                RecordError::Malformed {
                    file: self.file.clone(),
                    line: self.line,
                    reason,
                }
            }));
        }
    }
}

/// Tatoeba `sentences.csv`: `id \t lang \t text`, where a language of `\N`
/// marks an unlabelled sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TatoebaFormat;

impl RecordFormat for TatoebaFormat {
    fn name(&self) -> &'static str {
        "tatoeba"
    }

    fn parse_line(&self, line: &str) -> Result<Record, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut fields = line.splitn(3, '\t');
        let (Some(id), Some(language), Some(text)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err("expected 3 tab-separated fields".to_string());
        };
        if id.trim().parse::<u64>().is_err() {
            return Err(format!("invalid sentence id '{id}'"));
        }
        Ok(Record {
            language_code: language.to_string(),
            text: text.to_string(),
        })
    }
}
