//! Azure Blob Storage backend.
//!
//! Talks to the Blob service REST API directly: bearer-token
//! authentication, paginated listings with metadata, infinite leases,
//! user delegation SAS for read access, and asynchronous server-side copy.

mod client;
mod config;
mod connector;
mod credential;
mod response;
mod sas;
mod xml;

pub use client::{API_VERSION, AzureBlobClient};
pub use config::{
    AzureBlobConfig, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_LIST_PAGE_SIZE,
};
pub use connector::AzureConnector;
pub use credential::{
    AccessToken, ClientSecretCredential, CredentialConfig, DEFAULT_AUTHORITY_HOST, STORAGE_SCOPE,
    StaticTokenCredential, TokenCredential,
};

/// Tracing target for Azure backend operations.
pub const TRACING_TARGET: &str = "ferry_storage::azure";
