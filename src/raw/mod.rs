/// RAW image decoding module
///
/// This module handles:
/// - Extracting the embedded JPEG preview from RAW files (fast path)
/// - Developing the sensor data when no preview is embedded (slow path)

pub mod loader;
pub mod preview;
