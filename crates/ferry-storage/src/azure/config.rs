//! Blob service transport and listing settings.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use super::client::API_VERSION;

/// Default per-request timeout: 30 seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default TCP/TLS connect timeout: 10 seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Largest page the List Blobs operation returns (`maxresults`).
pub const MAX_LIST_PAGE_SIZE: u32 = 5000;

/// Settings shared by every [`AzureBlobClient`](super::AzureBlobClient)
/// created from one [`AzureConnector`](super::AzureConnector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AzureBlobConfig {
    /// Timeout for a single Blob service request in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "http-timeout",
            env = "FERRY_HTTP_TIMEOUT",
            default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for establishing a connection in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "http-connect-timeout",
            env = "FERRY_HTTP_CONNECT_TIMEOUT",
            default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
        )
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Objects requested per listing page, clamped to 1-5000
    #[cfg_attr(
        feature = "config",
        arg(
            long = "list-page-size",
            env = "FERRY_LIST_PAGE_SIZE",
            default_value_t = MAX_LIST_PAGE_SIZE
        )
    )]
    #[serde(default = "default_list_page_size")]
    pub list_page_size: u32,

    /// User-Agent sent to the Blob service
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "FERRY_HTTP_USER_AGENT")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_list_page_size() -> u32 {
    MAX_LIST_PAGE_SIZE
}

impl Default for AzureBlobConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            list_page_size: MAX_LIST_PAGE_SIZE,
            user_agent: None,
        }
    }
}

impl AzureBlobConfig {
    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    /// Sets the listing page size.
    #[must_use]
    pub fn with_list_page_size(mut self, page_size: u32) -> Self {
        self.list_page_size = page_size;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Listing page size within the service's accepted range.
    pub fn page_size(&self) -> u32 {
        self.list_page_size.clamp(1, MAX_LIST_PAGE_SIZE)
    }

    /// User agent naming the crate and the REST API version it speaks.
    pub fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) if !agent.is_empty() => agent.clone(),
            _ => format!(
                "ferry-storage/{} (blob-api {API_VERSION})",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }

    /// Builds the HTTP client shared by the credential and all containers.
    ///
    /// A zero timeout disables that timeout.
    pub fn build_http_client(&self) -> crate::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(self.user_agent());
        if self.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(self.request_timeout_secs));
        }
        if self.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(self.connect_timeout_secs));
        }

        builder.build().map_err(|e| {
            crate::Error::configuration()
                .with_message("failed to create HTTP client")
                .with_source(e)
        })
    }
}
