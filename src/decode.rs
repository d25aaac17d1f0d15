/// Image decoding for display
///
/// Turns a path into an RGB frame. Raster formats go straight through the
/// `image` crate; RAW files try the embedded preview first and develop the
/// sensor data only when there is none.

use image::{imageops::FilterType, DynamicImage, RgbImage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::raw::{loader, preview};
use crate::state::data::ImageKind;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Raster {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot develop RAW file {path}: {message}")]
    Raw { path: PathBuf, message: String },
    #[error("decode worker for {path} stopped: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Where a frame's pixels came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Raster,
    EmbeddedPreview,
    RawDevelop,
}

/// A decoded, display-ready frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub source: FrameSource,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decode `path` into a frame whose long edge is at most `max_edge` pixels.
///
/// `kind` comes from the scanner's extension check. Partially written files
/// fail here like corrupt ones; the caller is expected to retry later.
pub fn decode_frame(path: &Path, kind: ImageKind, max_edge: u32) -> Result<Frame, DecodeError> {
    let (img, source) = match kind {
        ImageKind::Raster => {
            let img = image::open(path).map_err(|source| DecodeError::Raster {
                path: path.to_path_buf(),
                source,
            })?;
            (img, FrameSource::Raster)
        }
        ImageKind::Raw => decode_raw(path)?,
    };

    Ok(Frame {
        image: fit_to_edge(img, max_edge).to_rgb8(),
        source,
    })
}

fn decode_raw(path: &Path) -> Result<(DynamicImage, FrameSource), DecodeError> {
    let data = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(img) = preview::extract_preview(&data) {
        return Ok((img, FrameSource::EmbeddedPreview));
    }

    log::info!(
        "No embedded preview in {}, developing sensor data (this can take a while)",
        path.display()
    );
    let developed = loader::develop_raw(path)?;
    Ok((DynamicImage::ImageRgb8(developed), FrameSource::RawDevelop))
}

fn fit_to_edge(img: DynamicImage, max_edge: u32) -> DynamicImage {
    if max_edge == 0 || img.width().max(img.height()) <= max_edge {
        return img;
    }
    img.resize(max_edge, max_edge, FilterType::Triangle)
}
