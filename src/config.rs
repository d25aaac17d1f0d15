/// Configuration file handling for tether-view.
///
/// Loads `ViewerConfig` from `<config_dir>/tether-view/config.json` or a custom
/// path given with `--config`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Poll interval window that keeps new pictures snappy without busy-looping
pub const MIN_POLL_MS: u64 = 200;
pub const MAX_POLL_MS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// How often the image directory is re-listed
    pub poll_interval_ms: u64,
    /// Wait before retrying a file that failed to decode
    pub decode_backoff_ms: u64,
    pub border_px: u32,
    pub selected_border: [u8; 3],
    pub neutral_border: [u8; 3],
    /// Decoded frames are downscaled so their long edge fits
    pub max_frame_edge: u32,
    pub fullscreen: bool,
    /// Tethered-capture utility, looked up on PATH unless absolute
    pub gphoto2_program: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            decode_backoff_ms: 2000,
            border_px: 24,
            selected_border: [46, 204, 64],
            neutral_border: [0, 0, 0],
            max_frame_edge: 2560,
            fullscreen: true,
            gphoto2_program: "gphoto2".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a file path, or the default location.
    /// Returns the default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.map(PathBuf::from).or_else(default_path) else {
            return Ok(Self::default());
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: ViewerConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config.normalized())
    }

    /// Clamp values that would break the viewer loop.
    pub fn normalized(mut self) -> Self {
        let clamped = self.poll_interval_ms.clamp(MIN_POLL_MS, MAX_POLL_MS);
        if clamped != self.poll_interval_ms {
            log::warn!(
                "poll_interval_ms {} outside {}..={}, using {}",
                self.poll_interval_ms,
                MIN_POLL_MS,
                MAX_POLL_MS,
                clamped
            );
            self.poll_interval_ms = clamped;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn decode_backoff(&self) -> Duration {
        Duration::from_millis(self.decode_backoff_ms)
    }
}

/// `<config_dir>/tether-view/config.json`, if the platform has a config dir
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tether-view").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::load(Some(&dir.path().join("config.json"))).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"border_px": 40, "fullscreen": false}"#).unwrap();

        let config = ViewerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.border_px, 40);
        assert!(!config.fullscreen);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.gphoto2_program, "gphoto2");
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{"poll_interval_ms": 10}"#).unwrap();
        assert_eq!(ViewerConfig::load(Some(&path)).unwrap().poll_interval_ms, MIN_POLL_MS);

        fs::write(&path, r#"{"poll_interval_ms": 5000}"#).unwrap();
        assert_eq!(ViewerConfig::load(Some(&path)).unwrap().poll_interval_ms, MAX_POLL_MS);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ border_px: ").unwrap();
        assert!(matches!(
            ViewerConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_durations() {
        let config = ViewerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.decode_backoff(), Duration::from_secs(2));
    }
}
