use std::collections::HashSet;
use std::path::Path;

/// The set of picked images, keyed by file name.
///
/// Membership is all that matters; iteration order is unspecified, use
/// `to_sorted_vec` when a stable order is needed (serialization, output).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    names: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from persisted identifiers. Full paths are reduced to
    /// their file name and blank entries are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .filter_map(|name| normalize_identifier(name.as_ref()))
            .collect();
        Self { names }
    }

    /// Add the name if absent, remove it if present.
    /// Returns whether the name is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let name = Path::new(trimmed)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())?;
    Some(name)
}
