/// Tethered capture through the external `gphoto2` utility.
///
/// The camera protocol lives entirely in gphoto2. This module only detects
/// cameras, validates the file name prefix and keeps the capture process
/// alive for as long as the viewer runs.

use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use thiserror::Error;

/// Characters that cannot appear in a file name prefix
const FORBIDDEN_PREFIX_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("'{0}' not found, install gphoto2 to capture")]
    NotInstalled(String),
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with {status}")]
    Failed { program: String, status: String },
    #[error("no camera connected")]
    NoCamera,
    #[error("invalid file name prefix {0:?}: must not be blank or contain / \\ : * ? \" < > |")]
    InvalidPrefix(String),
}

/// One line of `gphoto2 --auto-detect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCamera {
    pub model: String,
    pub port: String,
}

pub struct Gphoto2 {
    program: String,
}

impl Gphoto2 {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// List connected cameras.
    pub fn detect(&self) -> Result<Vec<DetectedCamera>, CameraError> {
        let output = Command::new(&self.program)
            .arg("--auto-detect")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(CameraError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
            });
        }
        Ok(parse_auto_detect(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Model of the first connected camera
    pub fn connected_model(&self) -> Result<String, CameraError> {
        self.detect()?
            .into_iter()
            .next()
            .map(|camera| camera.model)
            .ok_or(CameraError::NoCamera)
    }

    /// Start `--capture-tethered`, downloading every shot into `dir`.
    ///
    /// Files are named `<prefix>-<camera name>.<ext>`, or just the camera's
    /// own name when no prefix is given.
    pub fn start_tethered(&self, dir: &Path, prefix: Option<&str>) -> Result<TetheredCapture, CameraError> {
        if let Some(prefix) = prefix {
            validate_filename_prefix(prefix)?;
        }
        let pattern = filename_pattern(dir, prefix);

        // stdout stays quiet: the final selection is printed there
        let child = Command::new(&self.program)
            .arg("--capture-tethered")
            .arg("--filename")
            .arg(&pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        log::info!("Tethered capture started (pid {}) into {}", child.id(), pattern);
        Ok(TetheredCapture { child })
    }

    fn spawn_error(&self, source: io::Error) -> CameraError {
        if source.kind() == io::ErrorKind::NotFound {
            CameraError::NotInstalled(self.program.clone())
        } else {
            CameraError::Spawn {
                program: self.program.clone(),
                source,
            }
        }
    }
}

/// Running capture process. Terminated when dropped.
pub struct TetheredCapture {
    child: Child,
}

impl TetheredCapture {
    /// Whether the capture process is still alive
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Err(err) = self.child.kill() {
            log::warn!("Failed to stop tethered capture: {}", err);
            return;
        }
        match self.child.wait() {
            Ok(_) => log::info!("Tethered capture stopped"),
            Err(err) => log::warn!("Failed to reap tethered capture: {}", err),
        }
    }
}

impl Drop for TetheredCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parse `--auto-detect` output: two header lines, then `<model>  <port>`
/// with the port starting at `usb:` (or another `scheme:`).
pub fn parse_auto_detect(output: &str) -> Vec<DetectedCamera> {
    output
        .lines()
        .skip(2)
        .filter_map(|line| {
            let line = line.trim_end();
            if line.trim().is_empty() {
                return None;
            }
            let split = line.find("usb:").or_else(|| {
                line.rfind(char::is_whitespace)
                    .map(|i| i + 1)
                    .filter(|&i| line[i..].contains(':'))
            })?;
            let model = line[..split].trim();
            let port = line[split..].trim();
            (!model.is_empty()).then(|| DetectedCamera {
                model: model.to_string(),
                port: port.to_string(),
            })
        })
        .collect()
}

pub fn validate_filename_prefix(prefix: &str) -> Result<(), CameraError> {
    if prefix.trim().is_empty() || prefix.contains(&FORBIDDEN_PREFIX_CHARS[..]) {
        return Err(CameraError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Camera model as a file name prefix: "Nikon DSC D750" -> "Nikon_DSC_D750"
pub fn default_prefix(model: &str) -> String {
    model.trim().replace(' ', "_")
}

fn filename_pattern(dir: &Path, prefix: Option<&str>) -> String {
    let name = match prefix {
        Some(prefix) => format!("{prefix}-%f.%C"),
        None => "%f.%C".to_string(),
    };
    dir.join(name).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTO_DETECT: &str = "\
Model                          Port
----------------------------------------------------------
Nikon DSC D750                 usb:001,004
Canon EOS 5D Mark IV           usb:002,007
";

    #[test]
    fn test_parse_auto_detect() {
        let cameras = parse_auto_detect(AUTO_DETECT);
        assert_eq!(
            cameras,
            vec![
                DetectedCamera {
                    model: "Nikon DSC D750".to_string(),
                    port: "usb:001,004".to_string(),
                },
                DetectedCamera {
                    model: "Canon EOS 5D Mark IV".to_string(),
                    port: "usb:002,007".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_auto_detect_without_cameras() {
        let output = "Model                          Port\n----------------------------------\n";
        assert!(parse_auto_detect(output).is_empty());
        assert!(parse_auto_detect("").is_empty());
    }

    #[test]
    fn test_parse_auto_detect_other_port() {
        let output = "Model    Port\n-------\nSony Alpha-A7 III    ptpip:192.168.1.5\n";
        let cameras = parse_auto_detect(output);
        assert_eq!(cameras[0].model, "Sony Alpha-A7 III");
        assert_eq!(cameras[0].port, "ptpip:192.168.1.5");
    }

    #[test]
    fn test_prefix_validation() {
        assert!(validate_filename_prefix("wedding_2024").is_ok());
        assert!(validate_filename_prefix("Nikon DSC D750").is_ok());
        for bad in ["", "   ", "a/b", "a\\b", "c:", "x*", "why?", "\"q\"", "<a>", "a|b"] {
            assert!(
                matches!(validate_filename_prefix(bad), Err(CameraError::InvalidPrefix(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_default_prefix() {
        assert_eq!(default_prefix("Nikon DSC D750"), "Nikon_DSC_D750");
        assert_eq!(default_prefix(" Canon EOS R5 "), "Canon_EOS_R5");
    }

    #[test]
    fn test_filename_pattern() {
        let dir = Path::new("/shots");
        assert_eq!(filename_pattern(dir, Some("studio")), "/shots/studio-%f.%C");
        assert_eq!(filename_pattern(dir, None), "/shots/%f.%C");
    }

    #[test]
    fn test_missing_program() {
        let gphoto = Gphoto2::new("tether-view-no-such-program");
        assert!(matches!(gphoto.detect(), Err(CameraError::NotInstalled(_))));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            gphoto.start_tethered(dir.path(), None),
            Err(CameraError::NotInstalled(_))
        ));
    }

    #[test]
    fn test_invalid_prefix_is_rejected_before_spawning() {
        let gphoto = Gphoto2::new("tether-view-no-such-program");
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            gphoto.start_tethered(dir.path(), Some("bad/name")),
            Err(CameraError::InvalidPrefix(_))
        ));
    }
}
