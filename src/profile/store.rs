use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::{LanguageProfile, Metric};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Profile not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error on profile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed profile {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported profile version {version}")]
    UnsupportedVersion { version: u32 },
    #[error("Invalid '{metric}' histogram: {reason}")]
    Invalid { metric: Metric, reason: String },
    #[error("Rejected profile {}: {source}", path.display())]
    Rejected {
        path: PathBuf,
        #[source]
        source: Box<ProfileError>,
    },
}

/// Write a profile as JSON, atomically replacing any previous file.
pub fn save(profile: &LanguageProfile, path: &Path) -> Result<(), ProfileError> {
    let io_error = |source: std::io::Error| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir).map_err(io_error)?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(io_error)?;
    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer(&mut writer, profile).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_error)?;
    }

    temp_file
        .persist(path)
        .map_err(|e| io_error(e.error))?;

    tracing::debug!(path = %path.display(), "Saved profile");
    Ok(())
}

/// Read and validate a profile.
pub fn load(path: &Path) -> Result<LanguageProfile, ProfileError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ProfileError::NotFound(path.to_path_buf())
        } else {
            ProfileError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let profile: LanguageProfile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    profile.validate().map_err(|source| ProfileError::Rejected {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    Ok(profile)
}
