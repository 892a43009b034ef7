//! Blob store capability contract.
//!
//! [`BlobStore`] is the complete set of operations the transfer pipeline
//! needs from an object-storage service. The Azure backend in
//! [`crate::azure`] and the in-memory double in `ferry-test` both satisfy it.

mod connector;

use std::time::Duration;

use url::Url;

pub use connector::Connector;

use crate::error::Result;
use crate::types::{BlobEntry, CopyStatus, LeaseHandle, Metadata, ReadToken, StorageEndpoint};

/// Upper bound on the lifetime of issued read tokens. Stores clamp longer
/// requests to this value.
pub const MAX_READ_TOKEN_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Operations supported by a container-bound object store client.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Endpoint this client is bound to.
    fn endpoint(&self) -> &StorageEndpoint;

    /// Verify that the container is reachable with the configured credential.
    async fn verify_reachable(&self) -> Result<()> {
        Ok(())
    }

    /// List objects (with metadata) whose keys start with `prefix`.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<BlobEntry>>;

    /// Issue a read-only delegated credential for `key`, valid for `ttl`
    /// (at most [`MAX_READ_TOKEN_TTL`]).
    async fn issue_read_token(&self, key: &str, ttl: Duration) -> Result<ReadToken>;

    /// Acquire an exclusive, infinite-duration lease on `key`.
    async fn acquire_lease(&self, key: &str) -> Result<LeaseHandle>;

    /// Release a lease. Releasing an already released lease succeeds.
    async fn release_lease(&self, lease: &LeaseHandle) -> Result<()>;

    /// Begin a server-side copy of `source_url` into `target_key`.
    async fn start_copy(&self, source_url: &Url, target_key: &str) -> Result<CopyStatus>;

    /// Read the metadata of `key`.
    async fn get_metadata(&self, key: &str) -> Result<Metadata>;

    /// Replace the metadata of `key`.
    ///
    /// `lease` must be supplied while the object is leased.
    async fn set_metadata(
        &self,
        key: &str,
        metadata: &Metadata,
        lease: Option<&LeaseHandle>,
    ) -> Result<()>;
}
