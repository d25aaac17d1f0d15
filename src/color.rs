/// Color space conversion utilities
///
/// Used by the RAW development fallback:
/// - Camera RGB (sensor-native color space)
/// - XYZ (device-independent color space)
/// - sRGB (standard display color space)

use cgmath::{Matrix3, SquareMatrix, Vector3};

/// Standard sRGB to XYZ conversion matrix (D65 white point)
/// Source: IEC 61966-2-1:1999 (sRGB standard)
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

pub const IDENTITY: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Calculate the camera-to-sRGB color conversion matrix
///
/// # Arguments
/// * `xyz_to_cam` - The camera's XYZ to camera RGB matrix (from RAW metadata)
///
/// # Algorithm
/// 1. cam_from_srgb = xyz_to_cam × SRGB_TO_XYZ
/// 2. Normalize each row to sum to 1 so that white stays white after
///    white balance has been applied
/// 3. Invert to get srgb_from_cam
///
/// Falls back to identity when the metadata is empty, singular, or yields
/// extreme values.
pub fn calculate_cam_to_srgb_matrix(xyz_to_cam: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
    if is_zero_matrix(&xyz_to_cam) || is_identity_matrix(&xyz_to_cam) {
        return IDENTITY;
    }

    let mut cam_from_srgb = [[0.0f32; 3]; 3];
    for (row, out) in cam_from_srgb.iter_mut().enumerate() {
        for (col, value) in out.iter_mut().enumerate() {
            *value = (0..3).map(|k| xyz_to_cam[row][k] * SRGB_TO_XYZ[k][col]).sum();
        }
        let sum: f32 = out.iter().sum();
        if sum.abs() < f32::EPSILON {
            return IDENTITY;
        }
        for value in out.iter_mut() {
            *value /= sum;
        }
    }

    let Some(inverted) = from_rows(cam_from_srgb).invert() else {
        log::warn!("Camera color matrix is singular, using identity");
        return IDENTITY;
    };

    let result = to_rows(inverted);
    let has_extreme_values = result.iter().flatten().any(|&x| x.abs() > 10.0 || !x.is_finite());
    if has_extreme_values {
        log::warn!("Camera color matrix has extreme values, using identity");
        return IDENTITY;
    }

    result
}

/// Apply a row-major 3x3 matrix to an RGB triple
pub fn apply_matrix(matrix: &[[f32; 3]; 3], rgb: [f32; 3]) -> [f32; 3] {
    let out = from_rows(*matrix) * Vector3::new(rgb[0], rgb[1], rgb[2]);
    [out.x, out.y, out.z]
}

/// Linear light to 8-bit display value (simple 2.2 gamma)
pub fn encode_display(linear: f32) -> u8 {
    let clamped = linear.clamp(0.0, 1.0);
    (clamped.powf(1.0 / 2.2) * 255.0).round() as u8
}

/// Check if a color matrix is the identity matrix (no conversion)
pub fn is_identity_matrix(matrix: &[[f32; 3]; 3]) -> bool {
    const EPSILON: f32 = 0.001;
    matrix
        .iter()
        .zip(IDENTITY.iter())
        .all(|(row, id)| row.iter().zip(id).all(|(a, b)| (a - b).abs() < EPSILON))
}

fn is_zero_matrix(matrix: &[[f32; 3]; 3]) -> bool {
    matrix.iter().flatten().all(|&x| x == 0.0)
}

// cgmath is column-major: Matrix3::new takes columns
fn from_rows(m: [[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::new(
        m[0][0], m[1][0], m[2][0],
        m[0][1], m[1][1], m[2][1],
        m[0][2], m[1][2], m[2][2],
    )
}

fn to_rows(m: Matrix3<f32>) -> [[f32; 3]; 3] {
    [
        [m.x.x, m.y.x, m.z.x],
        [m.x.y, m.y.y, m.z.y],
        [m.x.z, m.y.z, m.z.z],
    ]
}
