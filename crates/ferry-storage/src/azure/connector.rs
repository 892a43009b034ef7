//! Connector producing [`AzureBlobClient`]s.

use std::sync::Arc;

use super::config::{AzureBlobConfig, MAX_LIST_PAGE_SIZE};
use super::credential::{CredentialConfig, TokenCredential};
use super::{AzureBlobClient, TRACING_TARGET};
use crate::error::Result;
use crate::store::{BlobStore, Connector};
use crate::types::StorageEndpoint;

/// Creates Azure Blob clients sharing one HTTP pool and credential.
#[derive(Clone)]
pub struct AzureConnector {
    http: reqwest::Client,
    credential: Arc<dyn TokenCredential>,
    page_size: u32,
}

impl AzureConnector {
    /// Creates a connector from an HTTP client and credential.
    pub fn new(http: reqwest::Client, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http,
            credential,
            page_size: MAX_LIST_PAGE_SIZE,
        }
    }

    /// Builds the HTTP client and credential from configuration.
    pub fn from_config(config: &AzureBlobConfig, credentials: &CredentialConfig) -> Result<Self> {
        let http = config.build_http_client()?;
        let credential = credentials.build(http.clone())?;
        Ok(Self::new(http, credential).with_page_size(config.page_size()))
    }

    /// Sets the listing page size of created clients.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl std::fmt::Debug for AzureConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConnector")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Connector for AzureConnector {
    fn id(&self) -> &'static str {
        "azure"
    }

    async fn connect(&self, endpoint: StorageEndpoint) -> Result<Box<dyn BlobStore>> {
        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %endpoint,
            account = endpoint.account_name(),
            "Creating Azure Blob client"
        );

        let client = AzureBlobClient::new(endpoint, self.credential.clone(), self.http.clone())
            .with_page_size(self.page_size);
        Ok(Box::new(client))
    }
}
