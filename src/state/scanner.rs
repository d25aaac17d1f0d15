/// Directory scanner for the session folder
///
/// Cheap by construction: only directory entries and their metadata are
/// read, nothing is decoded. Called on every poll of the viewer loop.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::data::{ImageFile, ImageKind};

#[derive(Debug, Error)]
pub enum ScanError {
    /// The directory itself is missing or cannot be listed
    #[error("image directory {path} is unavailable: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordering of the scanned list by modification time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first; the newest image is the last element
    Ascending,
    /// Newest first
    Descending,
}

/// List the supported images in `dir`, sorted by modification time.
///
/// Files that vanish between listing and stat are skipped; the next scan
/// picks up whatever is there by then. An empty directory is an empty list.
pub fn scan_images(dir: &Path, order: SortOrder) -> Result<Vec<ImageFile>, ScanError> {
    let unavailable = |source: io::Error| ScanError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    };

    let meta = fs::metadata(dir).map_err(unavailable)?;
    if !meta.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::NotFound,
            "not a directory",
        )));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "walk failed"));
                    return Err(unavailable(source));
                }
                log::debug!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = ImageKind::from_path(entry.path()) else {
            continue;
        };
        // The capture process may still be renaming or removing the file
        let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
            Some(modified) => modified,
            None => {
                log::debug!("File vanished during scan: {}", entry.path().display());
                continue;
            }
        };

        images.push(ImageFile::new(entry.into_path(), modified, kind));
    }

    images.sort_by(|a, b| match a.modified.cmp(&b.modified) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    if order == SortOrder::Descending {
        images.reverse();
    }

    Ok(images)
}

/// The most recently modified image in `dir`, if any
pub fn newest_image(dir: &Path) -> Result<Option<ImageFile>, ScanError> {
    Ok(scan_images(dir, SortOrder::Descending)?.into_iter().next())
}
