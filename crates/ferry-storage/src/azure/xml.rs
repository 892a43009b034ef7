//! XML bodies exchanged with the Blob service.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BlobEntry, Metadata};

/// `List Blobs` response page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct EnumerationResults {
    #[serde(default)]
    pub blobs: BlobList,
    #[serde(default)]
    pub next_marker: Option<String>,
}

impl EnumerationResults {
    /// Continuation marker for the next page, if any.
    pub fn continuation(&self) -> Option<&str> {
        self.next_marker.as_deref().filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BlobList {
    #[serde(rename = "Blob", default)]
    pub items: Vec<BlobItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct BlobItem {
    pub name: String,
    #[serde(default)]
    pub properties: Option<BlobProperties>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlobProperties {
    #[serde(rename = "Content-Length", default)]
    pub content_length: Option<u64>,
}

impl From<BlobItem> for BlobEntry {
    fn from(item: BlobItem) -> Self {
        Self {
            key: item.name,
            size: item.properties.and_then(|p| p.content_length),
            metadata: item.metadata.unwrap_or_default(),
        }
    }
}

/// `Get User Delegation Key` request body.
#[derive(Debug, Serialize)]
#[serde(rename = "KeyInfo", rename_all = "PascalCase")]
pub(crate) struct KeyInfo<'a> {
    pub start: &'a str,
    pub expiry: &'a str,
}

/// `Get User Delegation Key` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UserDelegationKey {
    pub signed_oid: String,
    pub signed_tid: String,
    pub signed_start: String,
    pub signed_expiry: String,
    pub signed_service: String,
    pub signed_version: String,
    pub value: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ServiceError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Decodes an XML response body.
pub(crate) fn from_str<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    quick_xml::de::from_str(body).map_err(|e| {
        Error::serialization()
            .with_message("malformed XML response")
            .with_source(e)
    })
}

/// Encodes an XML request body.
pub(crate) fn to_string<T: Serialize>(value: &T) -> Result<String> {
    quick_xml::se::to_string(value).map_err(|e| {
        Error::serialization()
            .with_message("cannot encode XML request")
            .with_source(e)
    })
}
