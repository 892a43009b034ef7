//! Idempotency marker on source objects.

use ferry_storage::types::Metadata;

use crate::options::DEFAULT_MARKER_KEY;

const MARKER_VALUE: &str = "true";

/// Metadata entry recording that a source object was already copied.
///
/// Names are compared without regard to ASCII case, as the service does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedMarker {
    name: String,
}

impl Default for CopiedMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_KEY)
    }
}

impl CopiedMarker {
    /// Creates a marker stored under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Metadata name of the marker.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `metadata` carries the marker set to true.
    pub fn is_set_on(&self, metadata: &Metadata) -> bool {
        metadata
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case(&self.name) && v.eq_ignore_ascii_case(MARKER_VALUE))
    }

    /// Adds the marker to `metadata`, keeping every other entry.
    pub fn merge_into(&self, mut metadata: Metadata) -> Metadata {
        metadata.retain(|k, _| !k.eq_ignore_ascii_case(&self.name));
        metadata.insert(self.name.clone(), MARKER_VALUE.to_owned());
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn detects_marker() {
        let marker = CopiedMarker::default();
        assert!(marker.is_set_on(&metadata(&[("copied", "true")])));
        assert!(marker.is_set_on(&metadata(&[("Copied", "True")])));
        assert!(!marker.is_set_on(&metadata(&[("copied", "false")])));
        assert!(!marker.is_set_on(&Metadata::new()));
    }

    #[test]
    fn merge_preserves_other_entries() {
        let marker = CopiedMarker::default();
        let merged = marker.merge_into(metadata(&[("source", "scraper"), ("Copied", "false")]));
        assert_eq!(merged, metadata(&[("copied", "true"), ("source", "scraper")]));
    }
}
