use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use super::HistogramError;
use crate::corpus::tokenizer::normalize_word;

/// A word file read back one normalized token at a time.
///
/// Lines are trimmed and case-folded again on the way in; blank lines are
/// skipped. The stream is consumed once and cannot be rewound.
pub struct WordStream<R> {
    lines: Lines<R>,
}

impl WordStream<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, HistogramError> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                HistogramError::NotFound(path.to_path_buf())
            } else {
                HistogramError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> WordStream<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl<R: BufRead> Iterator for WordStream<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(word) = normalize_word(&line) {
                        return Some(Ok(word));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
