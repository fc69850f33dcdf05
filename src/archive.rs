//! Container dispatch for uploaded raw exports.
//!
//! Uploads arrive as the vendor ships them: plain text, gzip, bzip2, or a
//! zip holding a single text file. Anything else is rejected up front with
//! guidance the embedding system can forward to the user.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Cursor, Read},
    path::Path,
};

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use thiserror::Error;
use zip::ZipArchive;

/// Guidance shown to users when an upload cannot be opened.
pub const ACCEPTED_FORMATS: &str = "Input file is expected to be either '.txt', '.gz', '.bz2', \
     or a single '.txt' file in a '.zip' ZIP archive.";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported input {path:?}: {ACCEPTED_FORMATS}")]
    UnsupportedExtension { path: String },
    #[error("ZIP archive {path:?} contains {entries} entries, expected exactly one: {ACCEPTED_FORMATS}")]
    AmbiguousZip { path: String, entries: usize },
    #[error("failed to read ZIP archive {path:?}: {source}")]
    Zip {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Resolves an uploaded file to a buffered text stream by extension.
pub fn open_export(path: &Path) -> Result<Box<dyn BufRead + Send>, ArchiveError> {
    let name = path.to_string_lossy().to_lowercase();

    if name.ends_with(".zip") {
        return open_zip(path);
    }

    if !name.ends_with(".gz") && !name.ends_with(".bz2") && !name.ends_with(".txt") {
        return Err(ArchiveError::UnsupportedExtension {
            path: path.display().to_string(),
        });
    }

    let file = File::open(path)?;
    if name.ends_with(".gz") {
        tracing::debug!(path = %path.display(), "opening gzip export");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else if name.ends_with(".bz2") {
        tracing::debug!(path = %path.display(), "opening bzip2 export");
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Opens a `.zip` upload that must hold exactly one real entry. macOS
/// resource-fork entries are ignored when counting.
fn open_zip(path: &Path) -> Result<Box<dyn BufRead + Send>, ArchiveError> {
    let display = path.display().to_string();

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
        path: display.clone(),
        source,
    })?;

    let names: Vec<String> = archive
        .file_names()
        .filter(|name| !name.starts_with("__MACOSX/"))
        .map(str::to_string)
        .collect();

    if names.len() != 1 {
        return Err(ArchiveError::AmbiguousZip {
            path: display,
            entries: names.len(),
        });
    }

    let mut entry = archive.by_name(&names[0]).map_err(|source| ArchiveError::Zip {
        path: display.clone(),
        source,
    })?;
    let mut contents = Vec::new();
    entry.read_to_end(&mut contents)?;
    Ok(Box::new(Cursor::new(contents)))
}
