//! Listing result for a single object.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// User-defined object metadata (name/value tags).
pub type Metadata = BTreeMap<String, String>;

/// Object returned by [`BlobStore::list_objects`](crate::BlobStore::list_objects).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Full object key within the container.
    pub key: String,
    /// Content length in bytes, if the listing reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Metadata attached to the object at listing time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl BlobEntry {
    /// Creates an entry with no size and empty metadata.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            metadata: Metadata::new(),
        }
    }

    /// Sets the content length.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Looks up a metadata value, ignoring ASCII case of the name.
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_lookup_ignores_case() {
        let entry = BlobEntry::new("a/b.pdf")
            .with_metadata(Metadata::from([("Copied".to_owned(), "true".to_owned())]));

        assert_eq!(entry.metadata_value("copied"), Some("true"));
        assert_eq!(entry.metadata_value("missing"), None);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let json = serde_json::to_string(&BlobEntry::new("k")).unwrap();
        assert_eq!(json, r#"{"key":"k"}"#);
    }
}
