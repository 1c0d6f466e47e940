//! Recursive extraction of nested archives.
//!
//! [`extract`] returns a lazy iterator over the files of an archive tree that
//! match a name predicate. Archives are recognized by their magic bytes and
//! unpacked one level at a time into randomly named scratch directories,
//! which are removed as soon as their contents have been walked.

mod archive;

pub use archive::ArchiveKind;

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Archive not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Corrupt archive {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("Archive {} is nested deeper than {max_depth} levels", path.display())]
    DepthExceeded { path: PathBuf, max_depth: usize },
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Parent of every scratch directory.
    pub scratch_root: PathBuf,
    /// Maximum number of nested archive levels.
    pub max_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One directory being walked. `scratch` owns the extracted tree, if any,
/// and deletes it when the frame is dropped.
struct Frame {
    dir: PathBuf,
    entries: ReadDir,
    depth: usize,
    scratch: Option<TempDir>,
}

impl Frame {
    fn open(dir: &Path, depth: usize, scratch: Option<TempDir>) -> Result<Self, ExtractError> {
        let entries = fs::read_dir(dir).map_err(|source| ExtractError::io(dir, source))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
            depth,
            scratch,
        })
    }
}

/// Lazy, non-restartable sequence of matching file paths.
///
/// Yielded paths may point into scratch directories and stay valid only until
/// the walk leaves the directory containing them.
pub struct ExtractedFiles<P> {
    root: Option<PathBuf>,
    stack: Vec<Frame>,
    predicate: P,
    options: ExtractOptions,
    fused: bool,
}

/// Walk `path` depth-first, unpacking nested archives, and yield every file
/// whose path satisfies `predicate`.
pub fn extract<P>(path: &Path, predicate: P, options: ExtractOptions) -> ExtractedFiles<P>
where
    P: FnMut(&Path) -> bool,
{
    ExtractedFiles {
        root: Some(path.to_path_buf()),
        stack: Vec::new(),
        predicate,
        options,
        fused: false,
    }
}

/// Predicate matching files by exact file name.
pub fn file_named(name: &str) -> impl FnMut(&Path) -> bool + Send + 'static {
    let name = name.to_string();
    move |path: &Path| path.file_name().is_some_and(|file_name| file_name == name.as_str())
}

impl<P> ExtractedFiles<P>
where
    P: FnMut(&Path) -> bool,
{
    /// Number of scratch directories currently alive.
    pub fn open_scratch_dirs(&self) -> usize {
        self.stack.iter().filter(|frame| frame.scratch.is_some()).count()
    }

    fn start(&mut self, root: PathBuf) -> Result<Option<PathBuf>, ExtractError> {
        let metadata = match fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractError::NotFound(root));
            }
            Err(source) => return Err(ExtractError::io(&root, source)),
        };

        if metadata.is_dir() {
            self.stack.push(Frame::open(&root, 0, None)?);
            return Ok(None);
        }

        self.visit_file(root, 0)
    }

    /// Either descend into an archive or report whether a plain file matches.
    fn visit_file(&mut self, path: PathBuf, depth: usize) -> Result<Option<PathBuf>, ExtractError> {
        match archive::sniff(&path)? {
            Some(kind) => {
                self.push_archive(&path, kind, depth + 1)?;
                Ok(None)
            }
            None if (self.predicate)(&path) => Ok(Some(path)),
            None => Ok(None),
        }
    }

    fn push_archive(&mut self, path: &Path, kind: ArchiveKind, depth: usize) -> Result<(), ExtractError> {
        if depth > self.options.max_depth {
            return Err(ExtractError::DepthExceeded {
                path: path.to_path_buf(),
                max_depth: self.options.max_depth,
            });
        }

        let root = &self.options.scratch_root;
        fs::create_dir_all(root).map_err(|source| ExtractError::io(root, source))?;
        let scratch = tempfile::Builder::new()
            .prefix("langprint-")
            .tempdir_in(root)
            .map_err(|source| ExtractError::io(root, source))?;

        tracing::debug!(
            archive = %path.display(),
            ?kind,
            depth,
            scratch = %scratch.path().display(),
            "Unpacking archive"
        );
        archive::unpack(path, kind, scratch.path())?;

        let dir = scratch.path().to_path_buf();
        self.stack.push(Frame::open(&dir, depth, Some(scratch))?);
        Ok(())
    }

    fn advance(&mut self) -> Result<Option<PathBuf>, ExtractError> {
        if let Some(root) = self.root.take() {
            if let Some(found) = self.start(root)? {
                return Ok(Some(found));
            }
        }

        while let Some(frame) = self.stack.last_mut() {
            let depth = frame.depth;
            let Some(entry) = frame.entries.next() else {
                // Dropping the frame removes its scratch tree.
                self.stack.pop();
                continue;
            };
            let entry = entry.map_err(|source| ExtractError::io(&frame.dir, source))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|source| ExtractError::io(&path, source))?;

            if file_type.is_dir() {
                self.stack.push(Frame::open(&path, depth, None)?);
            } else if file_type.is_file() {
                if let Some(found) = self.visit_file(path, depth)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }
}

impl<P> Iterator for ExtractedFiles<P>
where
    P: FnMut(&Path) -> bool,
{
    type Item = Result<PathBuf, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        match self.advance() {
            Ok(Some(path)) => Some(Ok(path)),
            Ok(None) => {
                self.fused = true;
                None
            }
            Err(e) => {
                self.fused = true;
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

impl<P> std::iter::FusedIterator for ExtractedFiles<P> where P: FnMut(&Path) -> bool {}
