//! Connector handing out registered [`MemoryStore`]s.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ferry_storage::types::StorageEndpoint;
use ferry_storage::{BlobStore, Connector, Error, ErrorKind, Result};

use super::store::MemoryStore;

/// [`Connector`] resolving endpoints to in-memory stores by container name.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    stores: Arc<Mutex<HashMap<String, MemoryStore>>>,
    failures: Arc<Mutex<HashMap<String, ErrorKind>>>,
}

impl MemoryConnector {
    /// Creates a connector with no stores.
    pub fn new() -> Self {
        Self::default()
    }

    fn stores(&self) -> MutexGuard<'_, HashMap<String, MemoryStore>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn failures(&self) -> MutexGuard<'_, HashMap<String, ErrorKind>> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `store` under its container name.
    pub fn register(&self, store: &MemoryStore) -> &Self {
        self.stores()
            .insert(store.endpoint().container().to_owned(), store.clone());
        self
    }

    /// Makes connecting to `container` fail with `kind`.
    pub fn fail_connect(&self, container: impl Into<String>, kind: ErrorKind) -> &Self {
        self.failures().insert(container.into(), kind);
        self
    }
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    fn id(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self, endpoint: StorageEndpoint) -> Result<Box<dyn BlobStore>> {
        if let Some(kind) = self.failures().get(endpoint.container()).copied() {
            return Err(Error::new(kind)
                .with_message("injected connect failure")
                .with_context(endpoint.to_string()));
        }

        let store = self.stores().get(endpoint.container()).cloned();
        match store {
            Some(store) => Ok(Box::new(store)),
            None => Err(Error::not_found()
                .with_message("no store registered for container")
                .with_context(endpoint.to_string())),
        }
    }
}
