/// Copy picked pictures out of the capture directory once the session ends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::state::scanner::{self, ScanError, SortOrder};
use crate::state::selection::SelectionSet;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("source and destination are the same directory: {0}")]
    SameDirectory(PathBuf),
    #[error("cannot create destination {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("failed to copy {name}: {source}")]
    Copy {
        name: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone)]
pub enum TransferMode {
    Selected(SelectionSet),
    All,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub copied: Vec<String>,
    /// Already present in the destination with the same size
    pub skipped: Vec<String>,
    /// Selected but no longer in the source directory
    pub missing: Vec<String>,
}

/// Copy images from `source` into `destination`, oldest first.
pub fn transfer(source: &Path, destination: &Path, mode: &TransferMode) -> Result<TransferReport, TransferError> {
    if same_directory(source, destination) {
        return Err(TransferError::SameDirectory(destination.to_path_buf()));
    }

    let images = scanner::scan_images(source, SortOrder::Ascending)?;
    fs::create_dir_all(destination).map_err(|source| TransferError::CreateDestination {
        path: destination.to_path_buf(),
        source,
    })?;

    let mut report = TransferReport::default();
    let wanted = |name: &str| match mode {
        TransferMode::Selected(selection) => selection.contains(name),
        TransferMode::All => true,
    };

    for image in images.iter().filter(|image| wanted(&image.name)) {
        let target = destination.join(&image.name);
        if already_copied(&image.path, &target) {
            log::debug!("{} already in destination, skipping", image.name);
            report.skipped.push(image.name.clone());
            continue;
        }

        fs::copy(&image.path, &target).map_err(|source| TransferError::Copy {
            name: image.name.clone(),
            source,
        })?;
        log::info!("Copied {}", image.name);
        report.copied.push(image.name.clone());
    }

    if let TransferMode::Selected(selection) = mode {
        report.missing = selection
            .to_sorted_vec()
            .into_iter()
            .filter(|name| !images.iter().any(|image| &image.name == name))
            .collect();
        for name in &report.missing {
            log::warn!("Selected picture {} is no longer in {}", name, source.display());
        }
    }

    Ok(report)
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn already_copied(source: &Path, target: &Path) -> bool {
    match (fs::metadata(source), fs::metadata(target)) {
        (Ok(src), Ok(dst)) => dst.is_file() && src.len() == dst.len(),
        _ => false,
    }
}
