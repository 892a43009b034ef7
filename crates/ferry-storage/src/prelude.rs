//! Convenience re-exports.

pub use crate::azure::{AzureBlobClient, AzureBlobConfig, AzureConnector, CredentialConfig};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::store::{BlobStore, Connector};
pub use crate::types::{
    BlobEntry, CopyStatus, LeaseHandle, Metadata, ReadToken, StorageEndpoint,
};
