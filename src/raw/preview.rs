/// Embedded preview extraction from RAW files
///
/// Cameras store one or more JPEG renditions inside the RAW container.
/// We scan for JPEG markers, walk each candidate's segment headers to get
/// its dimensions, and decode just the largest one.

use image::{DynamicImage, ImageFormat};

/// JPEG Start Of Image followed by the first marker prefix
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Stop probing after this many candidates; previews sit near the start
const MAX_CANDIDATES: usize = 8;

/// Previews smaller than this on their long edge are EXIF thumbnails,
/// not worth showing full screen
const MIN_PREVIEW_EDGE: u32 = 320;

/// A JPEG found inside the RAW container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewCandidate {
    pub offset: usize,
    pub width: u32,
    pub height: u32,
}

impl PreviewCandidate {
    fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Find JPEG streams inside `data` whose header parses, in file order.
pub fn find_candidates(data: &[u8]) -> Vec<PreviewCandidate> {
    let mut candidates = Vec::new();
    let mut pos = 0;

    while pos + JPEG_SOI.len() <= data.len() && candidates.len() < MAX_CANDIDATES {
        let Some(found) = data[pos..]
            .windows(JPEG_SOI.len())
            .position(|window| window == JPEG_SOI)
        else {
            break;
        };
        let offset = pos + found;

        if let Some((width, height)) = frame_dimensions(&data[offset..]) {
            candidates.push(PreviewCandidate {
                offset,
                width,
                height,
            });
        }
        pos = offset + JPEG_SOI.len();
    }

    candidates
}

/// Walk the marker segments of a JPEG stream up to its start-of-frame and
/// return (width, height). None if the stream is truncated or malformed.
fn frame_dimensions(jpeg: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    loop {
        if *jpeg.get(pos)? != 0xFF {
            return None;
        }
        let marker = *jpeg.get(pos + 1)?;
        match marker {
            // Fill bytes
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            // Start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([*jpeg.get(pos + 2)?, *jpeg.get(pos + 3)?]));
        if length < 2 {
            return None;
        }

        let is_frame_header = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame_header {
            let header = jpeg.get(pos + 4..pos + 9)?;
            let height = u32::from(u16::from_be_bytes([header[1], header[2]]));
            let width = u32::from(u16::from_be_bytes([header[3], header[4]]));
            if width == 0 || height == 0 {
                return None;
            }
            return Some((width, height));
        }

        pos += 2 + length;
    }
}

/// Decode the largest usable embedded preview, if the file has one.
pub fn extract_preview(data: &[u8]) -> Option<DynamicImage> {
    let mut candidates: Vec<PreviewCandidate> = find_candidates(data)
        .into_iter()
        .filter(|c| c.width.max(c.height) >= MIN_PREVIEW_EDGE)
        .collect();
    candidates.sort_by(|a, b| b.pixels().cmp(&a.pixels()));

    for candidate in candidates {
        // The decoder stops at the stream's own EOI; trailing RAW data is ignored
        match image::load_from_memory_with_format(&data[candidate.offset..], ImageFormat::Jpeg) {
            Ok(img) => {
                log::debug!(
                    "Embedded preview {}x{} at offset {}",
                    candidate.width,
                    candidate.height,
                    candidate.offset
                );
                return Some(img);
            }
            Err(err) => {
                log::debug!("Embedded JPEG at offset {} failed: {}", candidate.offset, err);
            }
        }
    }

    None
}
