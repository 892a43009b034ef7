//! Storage account and container addressing.

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{Error, Result};

/// Service root address plus the container a client is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEndpoint {
    account_url: Url,
    container: String,
    account_name: String,
}

impl StorageEndpoint {
    /// Creates an endpoint for `container` under `account_url`.
    ///
    /// The account name is the first DNS label of the host
    /// (`https://scrapers.blob.core.windows.net` → `scrapers`). For IP hosts
    /// such as a local emulator (`http://127.0.0.1:10000/devstoreaccount1`)
    /// it is the first path segment instead.
    pub fn new(account_url: Url, container: impl Into<String>) -> Result<Self> {
        let container = container.into();
        if container.is_empty() {
            return Err(Error::configuration().with_message("container name is empty"));
        }
        if account_url.cannot_be_a_base() || !matches!(account_url.scheme(), "http" | "https") {
            return Err(Error::configuration()
                .with_message(format!("unsupported account URL: {account_url}")));
        }

        let account_name = derive_account_name(&account_url).ok_or_else(|| {
            Error::configuration()
                .with_message(format!("cannot derive account name from {account_url}"))
        })?;

        Ok(Self {
            account_url,
            container,
            account_name,
        })
    }

    /// Parses `account_url` and creates an endpoint for `container`.
    pub fn parse(account_url: &str, container: impl Into<String>) -> Result<Self> {
        Self::new(Url::parse(account_url)?, container)
    }

    /// Overrides the derived account name.
    #[must_use]
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = account_name.into();
        self
    }

    /// Service root address.
    pub fn account_url(&self) -> &Url {
        &self.account_url
    }

    /// Storage account name.
    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// Container name.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Account root URL with an empty trailing segment removed.
    pub fn service_url(&self) -> Url {
        let mut url = self.account_url.clone();
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
        }
        url
    }

    /// Container URL.
    pub fn container_url(&self) -> Url {
        let mut url = self.service_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&self.container);
        }
        url
    }

    /// URL of the object at `key`, each path segment percent-encoded.
    pub fn object_url(&self, key: &str) -> Url {
        let mut url = self.container_url();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(key.split('/'));
        }
        url
    }
}

impl std::fmt::Display for StorageEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.container_url())
    }
}

fn derive_account_name(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) if domain != "localhost" => domain
            .split('.')
            .next()
            .filter(|label| !label.is_empty())
            .map(str::to_owned),
        _ => url
            .path_segments()?
            .find(|segment| !segment.is_empty())
            .map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_account_from_host() {
        let endpoint =
            StorageEndpoint::parse("https://scrapers.blob.core.windows.net/", "datalake").unwrap();
        assert_eq!(endpoint.account_name(), "scrapers");
        assert_eq!(endpoint.container(), "datalake");
        assert_eq!(
            endpoint.container_url().as_str(),
            "https://scrapers.blob.core.windows.net/datalake"
        );
    }

    #[test]
    fn derives_account_from_emulator_path() {
        let endpoint =
            StorageEndpoint::parse("http://127.0.0.1:10000/devstoreaccount1", "docs").unwrap();
        assert_eq!(endpoint.account_name(), "devstoreaccount1");
        assert_eq!(
            endpoint.container_url().as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/docs"
        );
    }

    #[test]
    fn object_url_encodes_segments() {
        let endpoint =
            StorageEndpoint::parse("https://scrapers.blob.core.windows.net", "datalake").unwrap();
        let url = endpoint.object_url("bronze/document_12/Treść obwieszczenia (pdf).pdf");
        assert_eq!(
            url.as_str(),
            "https://scrapers.blob.core.windows.net/datalake/bronze/document_12/Tre%C5%9B%C4%87%20obwieszczenia%20(pdf).pdf"
        );
    }

    #[test]
    fn rejects_empty_container() {
        assert!(StorageEndpoint::parse("https://a.blob.core.windows.net", "").is_err());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(StorageEndpoint::parse("ftp://a.blob.core.windows.net", "c").is_err());
    }

    #[test]
    fn account_name_override() {
        let endpoint = StorageEndpoint::parse("http://localhost:10000/", "c")
            .map(|e| e.with_account_name("devstoreaccount1"));
        // localhost with no path segment cannot derive an account name
        assert!(endpoint.is_err());

        let endpoint = StorageEndpoint::parse("https://a.blob.core.windows.net", "c")
            .unwrap()
            .with_account_name("other");
        assert_eq!(endpoint.account_name(), "other");
    }
}
