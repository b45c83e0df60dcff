//! FITS file discovery
//!
//! Walks an acquisition tree and collects FITS files grouped by the
//! directory that holds them. Only names and locations are gathered here;
//! nothing is opened or read, so enumeration is cheap even on slow storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScanError;

/// File name suffixes treated as FITS files. Matched case-insensitively.
pub const FITS_SUFFIXES: [&str; 3] = [".fits", ".fit", ".fts"];

/// FITS files found in one directory, sorted by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub directory: PathBuf,
    pub file_names: Vec<String>,
}

/// True when `file_name` carries a FITS suffix.
pub fn is_fits_name(file_name: &str) -> bool {
    let lowered = file_name.to_ascii_lowercase();
    FITS_SUFFIXES
        .iter()
        .any(|suffix| lowered.ends_with(suffix))
}

/// Recursively find all FITS files under `root`, grouped by directory.
///
/// Directories without any FITS file are omitted. Symbolic links are not
/// followed, so a link cycle cannot trap the walk and linked-in trees are
/// not scanned twice. Unreadable entries are logged and skipped; only a
/// missing or non-directory root aborts the enumeration.
pub fn enumerate_fits_files(root: &Path) -> Result<Vec<DirectoryListing>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut by_directory: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !is_fits_name(&file_name) {
            continue;
        }
        let directory = entry.path().parent().unwrap_or(root).to_path_buf();
        by_directory
            .entry(directory)
            .or_default()
            .push(file_name.into_owned());
    }

    Ok(by_directory
        .into_iter()
        .map(|(directory, mut file_names)| {
            file_names.sort();
            DirectoryListing {
                directory,
                file_names,
            }
        })
        .collect())
}
