/// RAW sensor data development
///
/// Slow path for RAW files without a usable embedded preview: load the
/// sensor data with rawloader and develop it into a display-ready RGB frame.
/// The result is half resolution (one output pixel per 2x2 Bayer block),
/// which is plenty for a full-screen preview.

use image::RgbImage;
use rawloader::{RawImage, RawImageData};
use std::path::Path;

use crate::color;
use crate::decode::DecodeError;

/// Per-image parameters applied while developing
#[derive(Debug, Clone, PartialEq)]
pub struct DevelopParams {
    /// White balance multipliers [R, G, B], normalized to green = 1.0
    pub wb_multipliers: [f32; 3],
    /// Camera RGB to sRGB, row-major
    pub color_matrix: [[f32; 3]; 3],
    pub black_levels: [f32; 4],
    pub white_levels: [f32; 4],
}

/// Decode and develop a RAW file. Blocking and CPU heavy.
pub fn develop_raw(path: &Path) -> Result<RgbImage, DecodeError> {
    let decoder = rawloader::RawLoader::new();
    let raw_image = decoder.decode_file(path).map_err(|e| DecodeError::Raw {
        path: path.to_path_buf(),
        message: format!("{:?}", e),
    })?;

    log::info!(
        "Developing {} {} sensor data: {}x{} (cpp {})",
        raw_image.make,
        raw_image.model,
        raw_image.width,
        raw_image.height,
        raw_image.cpp
    );

    let params = develop_params(&raw_image);
    develop(&raw_image, &params).ok_or_else(|| DecodeError::Raw {
        path: path.to_path_buf(),
        message: "unsupported sensor layout".to_string(),
    })
}

/// Extract white balance, levels and color matrix from the RAW metadata
pub fn develop_params(raw_image: &RawImage) -> DevelopParams {
    DevelopParams {
        wb_multipliers: normalize_white_balance(raw_image.wb_coeffs),
        color_matrix: color::calculate_cam_to_srgb_matrix([
            raw_image.xyz_to_cam[0],
            raw_image.xyz_to_cam[1],
            raw_image.xyz_to_cam[2],
        ]),
        black_levels: raw_image.blacklevels.map(f32::from),
        white_levels: raw_image.whitelevels.map(f32::from),
    }
}

/// As-shot white balance divided by green; neutral when missing or invalid
pub fn normalize_white_balance(wb_coeffs: [f32; 4]) -> [f32; 3] {
    let [r, g, b, _] = wb_coeffs;
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !(valid(r) && valid(g) && valid(b)) {
        log::warn!("No usable white balance data, using neutral [1.0, 1.0, 1.0]");
        return [1.0, 1.0, 1.0];
    }
    [r / g, 1.0, b / g]
}

fn develop(raw_image: &RawImage, params: &DevelopParams) -> Option<RgbImage> {
    // crops are [top, right, bottom, left]
    let [top, right, bottom, left] = raw_image.crops;
    let (x0, y0) = (left, top);
    let x1 = raw_image.width.saturating_sub(right);
    let y1 = raw_image.height.saturating_sub(bottom);
    if x1 <= x0 + 1 || y1 <= y0 + 1 {
        return None;
    }

    let sample = |index: usize, channel: usize| -> f32 {
        match &raw_image.data {
            RawImageData::Integer(values) => {
                let black = params.black_levels[channel];
                let range = (params.white_levels[channel] - black).max(1.0);
                (f32::from(values[index]) - black) / range
            }
            RawImageData::Float(values) => values[index],
        }
    };

    let out_w = ((x1 - x0) / 2) as u32;
    let out_h = ((y1 - y0) / 2) as u32;
    let mut out = RgbImage::new(out_w, out_h);

    match raw_image.cpp {
        1 => {
            let cfa = &raw_image.cfa;
            if cfa.width == 0 || cfa.height == 0 {
                return None;
            }
            for (ox, oy, pixel) in out.enumerate_pixels_mut() {
                let mut sums = [0.0f32; 3];
                let mut counts = [0u32; 3];
                for dy in 0..2 {
                    for dx in 0..2 {
                        let row = y0 + oy as usize * 2 + dy;
                        let col = x0 + ox as usize * 2 + dx;
                        let cfa_color = cfa.color_at(row, col);
                        // Fourth CFA color (emerald / second green) counts as green
                        let channel = if cfa_color > 2 { 1 } else { cfa_color };
                        sums[channel] += sample(row * raw_image.width + col, cfa_color.min(3));
                        counts[channel] += 1;
                    }
                }
                let rgb = [0, 1, 2].map(|c| {
                    if counts[c] == 0 {
                        0.0
                    } else {
                        sums[c] / counts[c] as f32
                    }
                });
                *pixel = finish_pixel(rgb, params);
            }
        }
        3 => {
            for (ox, oy, pixel) in out.enumerate_pixels_mut() {
                let row = y0 + oy as usize * 2;
                let col = x0 + ox as usize * 2;
                let base = (row * raw_image.width + col) * 3;
                let rgb = [0, 1, 2].map(|c| sample(base + c, c));
                *pixel = finish_pixel(rgb, params);
            }
        }
        _ => return None,
    }

    Some(out)
}

/// White balance, color matrix, gamma
fn finish_pixel(rgb: [f32; 3], params: &DevelopParams) -> image::Rgb<u8> {
    let balanced = [
        rgb[0] * params.wb_multipliers[0],
        rgb[1] * params.wb_multipliers[1],
        rgb[2] * params.wb_multipliers[2],
    ];
    let srgb = color::apply_matrix(&params.color_matrix, balanced);
    image::Rgb(srgb.map(color::encode_display))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        let result = develop_raw(Path::new("/nonexistent/path.nef"));
        assert!(matches!(result, Err(DecodeError::Raw { .. })));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.nef");
        std::fs::write(&path, b"definitely not a raw file").unwrap();
        assert!(develop_raw(&path).is_err());
    }

    #[test]
    fn test_white_balance_normalization() {
        assert_eq!(normalize_white_balance([2.0, 1.0, 1.5, f32::NAN]), [2.0, 1.0, 1.5]);
        assert_eq!(normalize_white_balance([4.0, 2.0, 3.0, 2.0]), [2.0, 1.0, 1.5]);
        assert_eq!(normalize_white_balance([f32::NAN, 1.0, 1.0, 1.0]), [1.0, 1.0, 1.0]);
        assert_eq!(normalize_white_balance([0.0, 0.0, 0.0, 0.0]), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_finish_pixel_neutral() {
        let params = DevelopParams {
            wb_multipliers: [1.0, 1.0, 1.0],
            color_matrix: color::IDENTITY,
            black_levels: [0.0; 4],
            white_levels: [4095.0; 4],
        };
        assert_eq!(finish_pixel([1.0, 1.0, 1.0], &params), image::Rgb([255, 255, 255]));
        assert_eq!(finish_pixel([0.0, 0.0, 0.0], &params), image::Rgb([0, 0, 0]));
    }
}
