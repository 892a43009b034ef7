//! Lease scope with guaranteed release.

use std::future::Future;

use ferry_storage::BlobStore;
use ferry_storage::types::LeaseHandle;

use crate::TRACING_TARGET;
use crate::error::{Result, TransferError};
use crate::stage::TransferStage;

/// Runs `body` while holding an exclusive lease on `key`.
///
/// The lease is released after `body` finishes, whatever it returned. A
/// failed release is logged and does not change the result of `body`.
pub async fn with_lease<T, F, Fut>(store: &dyn BlobStore, key: &str, body: F) -> Result<T>
where
    F: FnOnce(LeaseHandle) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let lease = store
        .acquire_lease(key)
        .await
        .map_err(|e| TransferError::attempt(key, TransferStage::Leased, e))?;

    let result = body(lease.clone()).await;

    if let Err(error) = store.release_lease(&lease).await {
        tracing::warn!(
            target: TRACING_TARGET,
            key,
            lease_id = lease.lease_id(),
            error = %error,
            "Failed to release lease"
        );
    }

    result
}
