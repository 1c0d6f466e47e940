//! Archive detection by magic bytes and single-level unpacking.
use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

use super::ExtractError;

const TAR_MAGIC_OFFSET: usize = 257;
const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Gzip,
    Bzip2,
    Tar,
}

impl ArchiveKind {
    /// Classify a file header. The file extension is never consulted.
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if head.starts_with(&[0x1F, 0x8B]) {
            Some(Self::Gzip)
        } else if head.starts_with(b"BZh") {
            Some(Self::Bzip2)
        } else if is_tar_header(head) {
            Some(Self::Tar)
        } else {
            None
        }
    }

    fn compression_suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Gzip => &[".gz", ".gzip"],
            Self::Bzip2 => &[".bz2", ".bzip2"],
            Self::Zip | Self::Tar => &[],
        }
    }
}

fn is_tar_header(head: &[u8]) -> bool {
    head.get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5) == Some(b"ustar".as_slice())
}

/// Read up to `limit` bytes, stopping early only at end of input.
fn read_head<R: Read>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(limit);
    reader.by_ref().take(limit as u64).read_to_end(&mut head)?;
    Ok(head)
}

pub fn sniff(path: &Path) -> Result<Option<ArchiveKind>, ExtractError> {
    let mut file = File::open(path).map_err(|source| ExtractError::io(path, source))?;
    let head = read_head(&mut file, SNIFF_LEN).map_err(|source| ExtractError::io(path, source))?;
    Ok(ArchiveKind::from_magic(&head))
}

/// Unpack one archive level into `dest`.
pub fn unpack(path: &Path, kind: ArchiveKind, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::io(path, source))?;
    let corrupt = |reason: String| ExtractError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    match kind {
        ArchiveKind::Zip => {
            let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;
            archive.extract(dest).map_err(|e| corrupt(e.to_string()))
        }
        ArchiveKind::Tar => tar::Archive::new(file)
            .unpack(dest)
            .map_err(|e| corrupt(e.to_string())),
        ArchiveKind::Gzip => unpack_stream(path, kind, MultiGzDecoder::new(file), dest),
        ArchiveKind::Bzip2 => unpack_stream(path, kind, MultiBzDecoder::new(file), dest),
    }
}

/// A compressed stream holds either a tar or a single file.
fn unpack_stream<R: Read>(path: &Path, kind: ArchiveKind, mut decoder: R, dest: &Path) -> Result<(), ExtractError> {
    let corrupt = |e: io::Error| ExtractError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let head = read_head(&mut decoder, SNIFF_LEN).map_err(corrupt)?;
    let mut payload = Cursor::new(head).chain(decoder);

    if is_tar_header(payload.get_ref().0.get_ref()) {
        return tar::Archive::new(payload).unpack(dest).map_err(corrupt);
    }

    let target = dest.join(decompressed_name(path, kind));
    let mut out = File::create(&target).map_err(|source| ExtractError::io(&target, source))?;
    io::copy(&mut payload, &mut out).map_err(corrupt)?;
    Ok(())
}

fn decompressed_name(path: &Path, kind: ArchiveKind) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "payload".to_string());
    kind.compression_suffixes()
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| name.clone(), str::to_string)
}
