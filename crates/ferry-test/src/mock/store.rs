//! In-memory blob container.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ferry_storage::types::{
    BlobEntry, CopyStatus, LeaseHandle, Metadata, ReadToken, StorageEndpoint,
};
use ferry_storage::{BlobStore, Error, ErrorKind, MAX_READ_TOKEN_TTL, Result};
use jiff::{SignedDuration, Timestamp};
use url::Url;

use super::fault::{Fault, StoreOperation};

/// Journal entry for one call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Operation invoked.
    pub operation: StoreOperation,
    /// Object key (or listing prefix) the call targeted.
    pub key: String,
}

#[derive(Debug, Clone, Default)]
struct StoredObject {
    size: Option<u64>,
    metadata: Metadata,
    lease_id: Option<String>,
    copy_source: Option<Url>,
}

#[derive(Debug)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    faults: Vec<Fault>,
    calls: Vec<Call>,
    copy_status: CopyStatus,
    next_lease: u64,
}

/// [`BlobStore`] backed by an in-memory map.
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    endpoint: StorageEndpoint,
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates an empty store bound to `endpoint`.
    pub fn new(endpoint: StorageEndpoint) -> Self {
        let state = State {
            objects: BTreeMap::new(),
            faults: Vec::new(),
            calls: Vec::new(),
            copy_status: CopyStatus::Pending,
            next_lease: 1,
        };

        Self {
            endpoint,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Creates an empty store for `container` under `account_url`.
    pub fn parse(account_url: &str, container: &str) -> Result<Self> {
        StorageEndpoint::parse(account_url, container).map(Self::new)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an object without metadata.
    pub fn insert(&self, key: impl Into<String>, size: u64) -> &Self {
        self.insert_with_metadata(key, size, Metadata::new())
    }

    /// Adds an object carrying `metadata`.
    pub fn insert_with_metadata(
        &self,
        key: impl Into<String>,
        size: u64,
        metadata: Metadata,
    ) -> &Self {
        let object = StoredObject {
            size: Some(size),
            metadata,
            ..StoredObject::default()
        };
        self.state().objects.insert(key.into(), object);
        self
    }

    /// Places a lease on `key` held by someone else.
    pub fn lease_externally(&self, key: &str) -> &Self {
        if let Some(object) = self.state().objects.get_mut(key) {
            object.lease_id = Some("external".to_owned());
        }
        self
    }

    /// Fails every call to `operation` with `kind`.
    pub fn fail(&self, operation: StoreOperation, kind: ErrorKind) -> &Self {
        self.state().faults.push(Fault::new(operation, kind));
        self
    }

    /// Fails the next `times` calls to `operation` with `kind`.
    pub fn fail_times(&self, operation: StoreOperation, kind: ErrorKind, times: usize) -> &Self {
        self.state()
            .faults
            .push(Fault::new(operation, kind).times(times));
        self
    }

    /// Fails every call to `operation` targeting `key`.
    pub fn fail_for_key(
        &self,
        operation: StoreOperation,
        key: impl Into<String>,
        kind: ErrorKind,
    ) -> &Self {
        self.state()
            .faults
            .push(Fault::new(operation, kind).for_key(key));
        self
    }

    /// Status reported by subsequent copies.
    pub fn set_copy_status(&self, status: CopyStatus) -> &Self {
        self.state().copy_status = status;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Keys targeted by calls to `operation`, in order.
    pub fn calls_for(&self, operation: StoreOperation) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .map(|call| call.key.clone())
            .collect()
    }

    /// Number of calls made to `operation`.
    pub fn count(&self, operation: StoreOperation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Whether an object exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.state().objects.contains_key(key)
    }

    /// Keys of all stored objects.
    pub fn keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    /// Metadata of `key`, if it exists.
    pub fn metadata(&self, key: &str) -> Option<Metadata> {
        self.state().objects.get(key).map(|o| o.metadata.clone())
    }

    /// Whether `key` is currently leased.
    pub fn is_leased(&self, key: &str) -> bool {
        self.state()
            .objects
            .get(key)
            .is_some_and(|o| o.lease_id.is_some())
    }

    /// Source URL a copy into `key` was started from.
    pub fn copy_source(&self, key: &str) -> Option<Url> {
        self.state()
            .objects
            .get(key)
            .and_then(|o| o.copy_source.clone())
    }

    /// Journals the call, then returns the first matching injected failure.
    fn enter(&self, operation: StoreOperation, key: &str) -> Result<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(Call {
            operation,
            key: key.to_owned(),
        });

        if let Some(error) = state
            .faults
            .iter_mut()
            .find_map(|fault| fault.trigger(operation, key))
        {
            return Err(error);
        }

        Ok(state)
    }
}

fn not_found(key: &str) -> Error {
    Error::not_found()
        .with_message("object does not exist")
        .with_context(key.to_owned())
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    fn endpoint(&self) -> &StorageEndpoint {
        &self.endpoint
    }

    async fn verify_reachable(&self) -> Result<()> {
        self.enter(StoreOperation::Verify, self.endpoint.container())?;
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let state = self.enter(StoreOperation::List, prefix)?;
        let entries = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| BlobEntry {
                key: key.clone(),
                size: object.size,
                metadata: object.metadata.clone(),
            })
            .collect();
        Ok(entries)
    }

    async fn issue_read_token(&self, key: &str, ttl: Duration) -> Result<ReadToken> {
        let state = self.enter(StoreOperation::IssueReadToken, key)?;
        if !state.objects.contains_key(key) {
            return Err(not_found(key));
        }

        let ttl = SignedDuration::try_from(ttl.min(MAX_READ_TOKEN_TTL)).map_err(|e| {
            Error::configuration()
                .with_message("token lifetime out of range")
                .with_source(e)
        })?;
        let expires_at = Timestamp::now().checked_add(ttl).map_err(|e| {
            Error::configuration()
                .with_message("token expiry out of range")
                .with_source(e)
        })?;

        Ok(ReadToken::new(
            key,
            self.endpoint.object_url(key),
            format!("sp=r&se={}&sig=memory", expires_at.as_second()),
            expires_at,
        ))
    }

    async fn acquire_lease(&self, key: &str) -> Result<LeaseHandle> {
        let mut state = self.enter(StoreOperation::AcquireLease, key)?;
        let lease_id = format!("lease-{}", state.next_lease);

        let object = state.objects.get_mut(key).ok_or_else(|| not_found(key))?;
        if object.lease_id.is_some() {
            return Err(Error::lease()
                .with_message("there is already a lease present")
                .with_context(key.to_owned()));
        }
        object.lease_id = Some(lease_id.clone());
        state.next_lease += 1;

        Ok(LeaseHandle::new(key, lease_id))
    }

    async fn release_lease(&self, lease: &LeaseHandle) -> Result<()> {
        let mut state = self.enter(StoreOperation::ReleaseLease, lease.key())?;
        if let Some(object) = state.objects.get_mut(lease.key())
            && object.lease_id.as_deref() == Some(lease.lease_id())
        {
            object.lease_id = None;
        }
        Ok(())
    }

    async fn start_copy(&self, source_url: &Url, target_key: &str) -> Result<CopyStatus> {
        let mut state = self.enter(StoreOperation::StartCopy, target_key)?;
        let status = state.copy_status;
        if status.is_accepted() {
            let object = StoredObject {
                copy_source: Some(source_url.clone()),
                ..StoredObject::default()
            };
            state.objects.insert(target_key.to_owned(), object);
        }
        Ok(status)
    }

    async fn get_metadata(&self, key: &str) -> Result<Metadata> {
        let state = self.enter(StoreOperation::GetMetadata, key)?;
        state
            .objects
            .get(key)
            .map(|o| o.metadata.clone())
            .ok_or_else(|| not_found(key))
    }

    async fn set_metadata(
        &self,
        key: &str,
        metadata: &Metadata,
        lease: Option<&LeaseHandle>,
    ) -> Result<()> {
        let mut state = self.enter(StoreOperation::SetMetadata, key)?;
        let object = state.objects.get_mut(key).ok_or_else(|| not_found(key))?;

        if let Some(held) = object.lease_id.as_deref()
            && lease.map(LeaseHandle::lease_id) != Some(held)
        {
            return Err(Error::lease()
                .with_message("object is leased and no matching lease id was given")
                .with_context(key.to_owned()));
        }

        object.metadata = metadata.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::parse("https://scrapers.blob.core.windows.net/", "datalake").unwrap()
    }

    #[tokio::test]
    async fn lists_by_prefix_with_metadata() {
        let store = store();
        store
            .insert("bronze/doc_1/a.pdf", 10)
            .insert_with_metadata(
                "bronze/doc_2/b.pdf",
                20,
                Metadata::from([("copied".to_owned(), "true".to_owned())]),
            )
            .insert("silver/c.pdf", 30);

        let entries = store.list_objects("bronze/").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].metadata_value("copied"), Some("true"));
        assert_eq!(store.calls_for(StoreOperation::List), vec!["bronze/"]);
    }

    #[tokio::test]
    async fn lease_is_exclusive() {
        let store = store();
        store.insert("a.pdf", 1);

        let lease = store.acquire_lease("a.pdf").await.unwrap();
        assert!(store.is_leased("a.pdf"));

        let err = store.acquire_lease("a.pdf").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lease);

        store.release_lease(&lease).await.unwrap();
        assert!(!store.is_leased("a.pdf"));
        // releasing twice is fine
        store.release_lease(&lease).await.unwrap();
    }

    #[tokio::test]
    async fn metadata_requires_matching_lease() {
        let store = store();
        store.insert("a.pdf", 1);
        let lease = store.acquire_lease("a.pdf").await.unwrap();
        let metadata = Metadata::from([("copied".to_owned(), "true".to_owned())]);

        let err = store
            .set_metadata("a.pdf", &metadata, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lease);

        store
            .set_metadata("a.pdf", &metadata, Some(&lease))
            .await
            .unwrap();
        assert_eq!(store.metadata("a.pdf"), Some(metadata));
    }

    #[tokio::test]
    async fn copy_records_source_unless_rejected() {
        let store = store();
        let source = Url::parse("https://src.blob.core.windows.net/c/a.pdf?sig=x").unwrap();

        assert_eq!(
            store.start_copy(&source, "docs/a.pdf").await.unwrap(),
            CopyStatus::Pending
        );
        assert_eq!(store.copy_source("docs/a.pdf"), Some(source.clone()));

        store.set_copy_status(CopyStatus::Failed);
        assert_eq!(
            store.start_copy(&source, "docs/b.pdf").await.unwrap(),
            CopyStatus::Failed
        );
        assert!(!store.contains("docs/b.pdf"));
    }

    #[tokio::test]
    async fn injected_failures_are_journaled() {
        let store = store();
        store.insert("a.pdf", 1);
        store.fail_times(StoreOperation::IssueReadToken, ErrorKind::Authentication, 1);

        let err = store
            .issue_read_token("a.pdf", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let token = store
            .issue_read_token("a.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(token.key(), "a.pdf");
        assert!(!token.is_expired_at(Timestamp::now()));
        assert_eq!(store.count(StoreOperation::IssueReadToken), 2);
    }

    #[tokio::test]
    async fn read_token_lifetime_is_capped() {
        let store = store();
        store.insert("a.pdf", 1);

        let token = store
            .issue_read_token("a.pdf", Duration::from_secs(24 * 60 * 60))
            .await
            .unwrap();
        let limit = Timestamp::now()
            .checked_add(SignedDuration::try_from(MAX_READ_TOKEN_TTL).unwrap())
            .unwrap();
        assert!(token.expires_at() <= limit);
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let store = store();
        let err = store.get_metadata("missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = store.acquire_lease("missing").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
