/// Selection sidecar persistence
///
/// The sidecar is the handoff contract with whoever launched the viewer:
/// a JSON array of file names stored next to the pictures. Reading is
/// forgiving (older sessions wrote `null`, `0` or a double-encoded string),
/// writing always produces a plain sorted array.

use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::selection::SelectionSet;

/// Fixed name of the sidecar file inside the image directory
pub const SIDECAR_FILE_NAME: &str = "selected_pictures.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write selection to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode selection: {0}")]
    Encode(#[from] serde_json::Error),
}

pub fn sidecar_path(image_dir: &Path) -> PathBuf {
    image_dir.join(SIDECAR_FILE_NAME)
}

/// Load the selection stored at `path`. Missing or malformed files give an
/// empty selection.
pub fn load(path: &Path) -> SelectionSet {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return SelectionSet::new(),
        Err(err) => {
            log::warn!("Cannot read {}: {}. Starting with an empty selection.", path.display(), err);
            return SelectionSet::new();
        }
    };
    parse_selection(&content)
}

/// Parse a serialized selection, as passed on the command line or stored in
/// the sidecar.
pub fn parse_selection(raw: &str) -> SelectionSet {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SelectionSet::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => from_value(value, true),
        Err(err) => {
            log::warn!("Ignoring malformed selection {:?}: {}", trimmed, err);
            SelectionSet::new()
        }
    }
}

fn from_value(value: Value, allow_nested: bool) -> SelectionSet {
    match value {
        Value::Array(items) => {
            let names: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    other => {
                        log::warn!("Ignoring non-string selection entry: {}", other);
                        None
                    }
                })
                .collect();
            SelectionSet::from_names(names)
        }
        Value::String(inner) if allow_nested => match inner.trim() {
            "" | "None" | "null" | "0" => SelectionSet::new(),
            encoded => match serde_json::from_str::<Value>(encoded) {
                Ok(nested) => from_value(nested, false),
                Err(_) => {
                    log::warn!("Ignoring selection string {:?}", encoded);
                    SelectionSet::new()
                }
            },
        },
        Value::Null | Value::Bool(false) => SelectionSet::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => SelectionSet::new(),
        other => {
            log::warn!("Unexpected selection value {}, using empty selection", other);
            SelectionSet::new()
        }
    }
}

/// Render the selection the way it is stored on disk
pub fn to_json(selection: &SelectionSet) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&selection.to_sorted_vec())?)
}

/// Write the selection to `path`, replacing any previous sidecar atomically.
pub fn save(selection: &SelectionSet, path: &Path) -> Result<(), PersistError> {
    let json = to_json(selection)?;
    let write_err = |source: io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }
    fs::rename(&tmp_path, path).map_err(write_err)?;

    log::info!("Saved {} selected picture(s) to {}", selection.len(), path.display());
    Ok(())
}
