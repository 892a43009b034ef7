//! Factory for container-bound [`BlobStore`] clients.

use super::BlobStore;
use crate::error::Result;
use crate::types::StorageEndpoint;

/// Creates authenticated [`BlobStore`] clients for an endpoint.
///
/// Implementations handle credential wiring and client construction for
/// a specific backend. Connecting does not contact the service; call
/// [`BlobStore::verify_reachable`] for that.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Unique backend identifier (e.g. "azure", "memory").
    fn id(&self) -> &'static str;

    /// Create a client bound to `endpoint`.
    async fn connect(&self, endpoint: StorageEndpoint) -> Result<Box<dyn BlobStore>>;
}
