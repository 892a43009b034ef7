//! Ingestion entry point.

use ferry_storage::types::StorageEndpoint;
use ferry_storage::{BlobStore, Connector};
use url::Url;
use validator::Validate;

use crate::TRACING_TARGET;
use crate::error::{Result, StoreRole, TransferError};
use crate::options::TransferOptions;
use crate::orchestrator::TransferOrchestrator;
use crate::report::TransferReport;
use crate::spec::TransferSpec;

/// Connects the source and target stores and runs one transfer.
///
/// Holds the account addresses; containers come from each [`TransferSpec`].
#[derive(Debug, Clone)]
pub struct IngestionService<C> {
    connector: C,
    source_account: Url,
    target_account: Url,
    options: TransferOptions,
}

impl<C: Connector> IngestionService<C> {
    /// Creates a service with default [`TransferOptions`].
    pub fn new(connector: C, source_account: Url, target_account: Url) -> Self {
        Self {
            connector,
            source_account,
            target_account,
            options: TransferOptions::default(),
        }
    }

    /// Replaces the transfer options.
    #[must_use]
    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    /// Transfer options in use.
    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Runs one transfer described by `spec`.
    ///
    /// Fails only when the spec is invalid, a store cannot be reached, or
    /// the source listing fails. Per-object failures are in the report.
    #[tracing::instrument(
        name = "ingest",
        skip_all,
        fields(
            connector = self.connector.id(),
            source = %spec.source_container,
            target = %spec.target_container,
        )
    )]
    pub async fn ingest(&self, spec: &TransferSpec) -> Result<TransferReport> {
        spec.validate()?;

        let source = self
            .connect(StoreRole::Source, &self.source_account, &spec.source_container)
            .await?;
        let target = self
            .connect(StoreRole::Target, &self.target_account, &spec.target_container)
            .await?;

        TransferOrchestrator::new(source.as_ref(), target.as_ref(), &self.options)
            .run(spec)
            .await
    }

    async fn connect(
        &self,
        role: StoreRole,
        account: &Url,
        container: &str,
    ) -> Result<Box<dyn BlobStore>> {
        let connect_error = |source| TransferError::Connect { role, source };

        let endpoint = StorageEndpoint::new(account.clone(), container).map_err(connect_error)?;
        let store = self
            .connector
            .connect(endpoint)
            .await
            .map_err(connect_error)?;
        store.verify_reachable().await.map_err(connect_error)?;

        tracing::debug!(
            target: TRACING_TARGET,
            %role,
            endpoint = %store.endpoint(),
            "Store connected"
        );
        Ok(store)
    }
}
