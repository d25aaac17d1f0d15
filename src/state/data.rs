/// Shared data structures for the viewer state
///
/// These structs represent the files the capture process drops into the
/// session directory, as seen by the scanner and the viewer loop.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extensions decoded directly by the `image` crate
pub const RASTER_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

/// Camera RAW extensions (embedded preview first, sensor decode as fallback)
pub const RAW_EXTENSIONS: [&str; 3] = ["nef", "cr2", "arw"];

/// How a file has to be decoded for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Raster,
    Raw,
}

impl ImageKind {
    /// Classify a path by its extension (case-insensitive).
    /// Returns None for anything that is not a supported still image.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            Some(ImageKind::Raster)
        } else if RAW_EXTENSIONS.contains(&ext.as_str()) {
            Some(ImageKind::Raw)
        } else {
            None
        }
    }
}

/// A single image in the session directory
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Filename only (e.g., "DSC_0001.NEF"), used as the selection identifier
    pub name: String,
    /// Last modification time reported by the filesystem
    pub modified: SystemTime,
    pub kind: ImageKind,
}

impl ImageFile {
    pub fn new(path: PathBuf, modified: SystemTime, kind: ImageKind) -> Self {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            path,
            name,
            modified,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(ImageKind::from_path(Path::new("a.jpg")), Some(ImageKind::Raster));
        assert_eq!(ImageKind::from_path(Path::new("a.TIFF")), Some(ImageKind::Raster));
        assert_eq!(ImageKind::from_path(Path::new("DSC_0001.NEF")), Some(ImageKind::Raw));
        assert_eq!(ImageKind::from_path(Path::new("IMG_1.Cr2")), Some(ImageKind::Raw));
        assert_eq!(ImageKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(ImageKind::from_path(Path::new("selected_pictures.json")), None);
        assert_eq!(ImageKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_image_file_name() {
        let file = ImageFile::new(
            PathBuf::from("/tmp/session/DSC_0001.NEF"),
            SystemTime::UNIX_EPOCH,
            ImageKind::Raw,
        );
        assert_eq!(file.name, "DSC_0001.NEF");
    }
}
