//! Blob service REST client.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use percent_encoding::utf8_percent_encode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use super::config::MAX_LIST_PAGE_SIZE;
use super::credential::{STORAGE_SCOPE, TokenCredential};
use super::response::{Operation, check, error_code};
use super::sas::{BlobSas, QUERY_VALUE};
use super::xml::{self, EnumerationResults, KeyInfo, UserDelegationKey};
use super::TRACING_TARGET;
use crate::error::{Error, Result};
use crate::store::{BlobStore, MAX_READ_TOKEN_TTL};
use crate::types::{BlobEntry, CopyStatus, LeaseHandle, Metadata, ReadToken, StorageEndpoint};

/// REST API version sent with every request.
pub const API_VERSION: &str = "2021-08-06";

const META_PREFIX: &str = "x-ms-meta-";
const LEASE_ID: &str = "x-ms-lease-id";

struct AzureBlobClientInner {
    http: reqwest::Client,
    endpoint: StorageEndpoint,
    credential: Arc<dyn TokenCredential>,
}

/// Container-bound Azure Blob Storage client authenticated with bearer tokens.
///
/// Cloning is cheap; clones share the HTTP connection pool and credential.
#[derive(Clone)]
pub struct AzureBlobClient {
    inner: Arc<AzureBlobClientInner>,
    page_size: u32,
}

impl AzureBlobClient {
    /// Creates a client for `endpoint`.
    pub fn new(
        endpoint: StorageEndpoint,
        credential: Arc<dyn TokenCredential>,
        http: reqwest::Client,
    ) -> Self {
        let inner = AzureBlobClientInner {
            http,
            endpoint,
            credential,
        };

        Self {
            inner: Arc::new(inner),
            page_size: MAX_LIST_PAGE_SIZE,
        }
    }

    /// Sets the number of objects requested per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_LIST_PAGE_SIZE);
        self
    }

    /// Authenticated request carrying the service version headers.
    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.inner.credential.get_token(STORAGE_SCOPE).await?;
        Ok(self
            .inner
            .http
            .request(method, url)
            .bearer_auth(token.secret())
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", http_date(Timestamp::now())))
    }

    /// Lease management request for `key`.
    async fn lease_request(&self, key: &str, action: &str) -> Result<RequestBuilder> {
        let url = with_query(self.inner.endpoint.object_url(key), &[("comp", "lease")]);
        Ok(self
            .request(Method::PUT, url)
            .await?
            .header("x-ms-lease-action", action)
            .header(CONTENT_LENGTH, "0"))
    }

    async fn user_delegation_key(
        &self,
        start: &str,
        expiry: &str,
    ) -> Result<UserDelegationKey> {
        let url = with_query(
            self.inner.endpoint.service_url(),
            &[("restype", "service"), ("comp", "userdelegationkey")],
        );
        let body = xml::to_string(&KeyInfo { start, expiry })?;

        let response = self
            .request(Method::POST, url)
            .await?
            .header(CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await?;
        let response = check(
            response,
            Operation::GetUserDelegationKey,
            self.inner.endpoint.account_name(),
        )
        .await?;

        xml::from_str(&response.text().await?)
    }
}

impl std::fmt::Debug for AzureBlobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobClient")
            .field("endpoint", &self.inner.endpoint)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl BlobStore for AzureBlobClient {
    fn endpoint(&self) -> &StorageEndpoint {
        &self.inner.endpoint
    }

    #[tracing::instrument(name = "azure.verify", skip(self), fields(endpoint = %self.inner.endpoint))]
    async fn verify_reachable(&self) -> Result<()> {
        let url = with_query(
            self.inner.endpoint.container_url(),
            &[("restype", "container")],
        );
        let response = self.request(Method::GET, url).await?.send().await?;
        check(
            response,
            Operation::GetContainerProperties,
            self.inner.endpoint.container(),
        )
        .await?;

        tracing::debug!(target: TRACING_TARGET, "Container reachable");
        Ok(())
    }

    #[tracing::instrument(name = "azure.list", skip(self), fields(container = self.inner.endpoint.container()))]
    async fn list_objects(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;
        let mut pages = 0usize;
        let page_size = self.page_size.to_string();

        loop {
            let url = {
                let mut pairs = vec![
                    ("restype", "container"),
                    ("comp", "list"),
                    ("include", "metadata"),
                    ("maxresults", page_size.as_str()),
                ];
                if !prefix.is_empty() {
                    pairs.push(("prefix", prefix));
                }
                if let Some(marker) = marker.as_deref() {
                    pairs.push(("marker", marker));
                }
                with_query(self.inner.endpoint.container_url(), &pairs)
            };

            let response = self.request(Method::GET, url).await?.send().await?;
            let response = check(response, Operation::ListBlobs, prefix).await?;
            let page: EnumerationResults = xml::from_str(&response.text().await?)?;

            pages += 1;
            marker = page.continuation().map(str::to_owned);
            entries.extend(page.blobs.items.into_iter().map(BlobEntry::from));

            if marker.is_none() {
                break;
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            pages,
            objects = entries.len(),
            "Listed objects"
        );
        Ok(entries)
    }

    #[tracing::instrument(name = "azure.read_token", skip(self))]
    async fn issue_read_token(&self, key: &str, ttl: Duration) -> Result<ReadToken> {
        let ttl = ttl.min(MAX_READ_TOKEN_TTL);
        let now = Timestamp::now();
        let expires_at = now
            .checked_add(SignedDuration::from_secs(ttl.as_secs() as i64))
            .map_err(|e| {
                Error::configuration()
                    .with_message("read token expiry out of range")
                    .with_source(e)
            })?;

        let start = sas_time(now);
        let expiry = sas_time(expires_at);
        let delegation_key = self.user_delegation_key(&start, &expiry).await?;

        let query = BlobSas {
            account: self.inner.endpoint.account_name(),
            container: self.inner.endpoint.container(),
            blob: key,
            permissions: "r",
            start: &start,
            expiry: &expiry,
            key: &delegation_key,
        }
        .to_query()
        .map_err(|e| e.with_context(key.to_owned()))?;

        tracing::debug!(target: TRACING_TARGET, %expires_at, "Issued read token");
        Ok(ReadToken::new(
            key,
            self.inner.endpoint.object_url(key),
            query,
            expires_at,
        ))
    }

    #[tracing::instrument(name = "azure.acquire_lease", skip(self))]
    async fn acquire_lease(&self, key: &str) -> Result<LeaseHandle> {
        let response = self
            .lease_request(key, "acquire")
            .await?
            .header("x-ms-lease-duration", "-1")
            .send()
            .await?;
        let response = check(response, Operation::AcquireLease, key).await?;

        let lease_id = header_str(&response, LEASE_ID).ok_or_else(|| {
            Error::lease()
                .with_message("lease response carried no lease id")
                .with_context(key.to_owned())
        })?;

        tracing::debug!(target: TRACING_TARGET, lease_id, "Lease acquired");
        Ok(LeaseHandle::new(key, lease_id))
    }

    #[tracing::instrument(name = "azure.release_lease", skip(self, lease), fields(key = lease.key()))]
    async fn release_lease(&self, lease: &LeaseHandle) -> Result<()> {
        let response = self
            .lease_request(lease.key(), "release")
            .await?
            .header(LEASE_ID, lease.lease_id())
            .send()
            .await?;

        if is_already_released(&response) {
            tracing::debug!(
                target: TRACING_TARGET,
                status = %response.status(),
                "Lease already released"
            );
            return Ok(());
        }

        check(response, Operation::ReleaseLease, lease.key()).await?;
        tracing::debug!(target: TRACING_TARGET, "Lease released");
        Ok(())
    }

    #[tracing::instrument(name = "azure.copy", skip(self, source_url))]
    async fn start_copy(&self, source_url: &Url, target_key: &str) -> Result<CopyStatus> {
        let url = self.inner.endpoint.object_url(target_key);
        let response = self
            .request(Method::PUT, url)
            .await?
            .header("x-ms-copy-source", source_url.as_str())
            .header(CONTENT_LENGTH, "0")
            .send()
            .await?;
        let response = check(response, Operation::CopyBlob, target_key).await?;

        let status = match header_str(&response, "x-ms-copy-status") {
            Some(value) => CopyStatus::from_str(value).map_err(|e| {
                Error::serialization()
                    .with_message(format!("unexpected copy status: {value}"))
                    .with_source(e)
                    .with_context(target_key.to_owned())
            })?,
            None => CopyStatus::Pending,
        };

        tracing::debug!(target: TRACING_TARGET, %status, "Copy initiated");
        Ok(status)
    }

    #[tracing::instrument(name = "azure.get_metadata", skip(self))]
    async fn get_metadata(&self, key: &str) -> Result<Metadata> {
        let url = with_query(self.inner.endpoint.object_url(key), &[("comp", "metadata")]);
        let response = self.request(Method::GET, url).await?.send().await?;
        let response = check(response, Operation::GetMetadata, key).await?;

        metadata_from_headers(response.headers()).map_err(|e| e.with_context(key.to_owned()))
    }

    #[tracing::instrument(
        name = "azure.set_metadata",
        skip(self, metadata, lease),
        fields(leased = lease.is_some())
    )]
    async fn set_metadata(
        &self,
        key: &str,
        metadata: &Metadata,
        lease: Option<&LeaseHandle>,
    ) -> Result<()> {
        let url = with_query(self.inner.endpoint.object_url(key), &[("comp", "metadata")]);
        let mut headers = metadata_to_headers(metadata).map_err(|e| e.with_context(key.to_owned()))?;
        if let Some(lease) = lease {
            let value = HeaderValue::from_str(lease.lease_id()).map_err(|e| {
                Error::lease()
                    .with_message("lease id is not a valid header value")
                    .with_source(e)
            })?;
            headers.insert(HeaderName::from_static(LEASE_ID), value);
        }

        let response = self
            .request(Method::PUT, url)
            .await?
            .headers(headers)
            .header(CONTENT_LENGTH, "0")
            .send()
            .await?;
        check(response, Operation::SetMetadata, key).await?;

        tracing::debug!(target: TRACING_TARGET, entries = metadata.len(), "Metadata written");
        Ok(())
    }
}

/// Appends percent-encoded query pairs. `Url::query_pairs_mut` would emit
/// `+` for spaces, which the service does not decode in SAS values.
fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
    let query = pairs
        .iter()
        .map(|(name, value)| format!("{name}={}", utf8_percent_encode(value, QUERY_VALUE)))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&query));
    url
}

/// RFC 1123 date for the `x-ms-date` header.
fn http_date(ts: Timestamp) -> String {
    ts.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Second-precision UTC time as used by SAS fields.
fn sas_time(ts: Timestamp) -> String {
    ts.strftime("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Release outcomes meaning the lease no longer exists.
fn is_already_released(response: &Response) -> bool {
    match response.status() {
        StatusCode::NOT_FOUND => true,
        StatusCode::CONFLICT => matches!(
            error_code(response).as_deref(),
            Some("LeaseNotPresentWithLeaseOperation" | "LeaseIdMismatchWithLeaseOperation")
        ),
        _ => false,
    }
}

/// Collects `x-ms-meta-*` headers. Values that are not ASCII fail the read
/// so a later write of the merged map cannot drop them.
fn metadata_from_headers(headers: &HeaderMap) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for (name, value) in headers {
        let Some(name) = name.as_str().strip_prefix(META_PREFIX) else {
            continue;
        };
        let value = value.to_str().map_err(|e| {
            Error::metadata()
                .with_message(format!("metadata {name} is not an ASCII value"))
                .with_source(e)
        })?;
        metadata.insert(name.to_owned(), value.to_owned());
    }
    Ok(metadata)
}

fn metadata_to_headers(metadata: &Metadata) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(metadata.len());
    for (name, value) in metadata {
        let header = HeaderName::from_bytes(format!("{META_PREFIX}{name}").as_bytes())
            .map_err(|e| {
                Error::metadata()
                    .with_message(format!("invalid metadata name: {name}"))
                    .with_source(e)
            })?;
        // The service stores metadata values as ASCII only.
        if !value.is_ascii() {
            return Err(Error::metadata()
                .with_message(format!("metadata {name} is not an ASCII value")));
        }
        let value = HeaderValue::from_str(value).map_err(|e| {
            Error::metadata()
                .with_message(format!("invalid value for metadata {name}"))
                .with_source(e)
        })?;
        headers.insert(header, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_keeps_spaces_percent_encoded() {
        let url = Url::parse("https://a.blob.core.windows.net/c").unwrap();
        let url = with_query(url, &[("restype", "container"), ("prefix", "bronze/a b")]);
        assert_eq!(url.query(), Some("restype=container&prefix=bronze%2Fa%20b"));
    }

    #[test]
    fn formats_dates() {
        let ts = Timestamp::from_second(1_704_067_200).unwrap();
        assert_eq!(http_date(ts), "Mon, 01 Jan 2024 00:00:00 GMT");
        assert_eq!(sas_time(ts), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn metadata_headers_round_trip() {
        let metadata = Metadata::from([
            ("copied".to_owned(), "true".to_owned()),
            ("source".to_owned(), "scraper".to_owned()),
        ]);
        let headers = metadata_to_headers(&metadata).unwrap();
        assert_eq!(headers.get("x-ms-meta-copied").unwrap(), "true");
        assert_eq!(metadata_from_headers(&headers).unwrap(), metadata);
    }

    #[test]
    fn unrelated_headers_are_not_metadata() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static(API_VERSION));
        headers.insert("x-ms-meta-copied", HeaderValue::from_static("true"));
        let metadata = metadata_from_headers(&headers).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("copied").map(String::as_str), Some("true"));
    }

    #[test]
    fn rejects_non_ascii_metadata_value() {
        let metadata = Metadata::from([
            ("note".to_owned(), "Treść".to_owned()),
            ("copied".to_owned(), "false".to_owned()),
        ]);
        let err = metadata_to_headers(&metadata).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Metadata);
    }

    #[test]
    fn undecodable_metadata_value_fails_read() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-meta-copied", HeaderValue::from_static("false"));
        headers.insert(
            "x-ms-meta-note",
            HeaderValue::from_bytes("Treść".as_bytes()).unwrap(),
        );
        let err = metadata_from_headers(&headers).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Metadata);
    }

    mod http {
        use httpmock::prelude::*;

        use super::*;
        use crate::ErrorKind;
        use crate::azure::StaticTokenCredential;

        const CONTAINER: &str = "/devstoreaccount1/datalake";

        fn client(server: &MockServer) -> AzureBlobClient {
            let endpoint =
                StorageEndpoint::parse(&format!("{}/devstoreaccount1", server.base_url()), "datalake")
                    .unwrap();
            AzureBlobClient::new(
                endpoint,
                Arc::new(StaticTokenCredential::new("token")),
                reqwest::Client::new(),
            )
        }

        fn object_path(key: &str) -> String {
            format!("{CONTAINER}/{key}")
        }

        #[tokio::test]
        async fn list_follows_continuation_markers() {
            let server = MockServer::start_async().await;
            let first = server.mock(|when, then| {
                when.method(GET)
                    .path(CONTAINER)
                    .query_param("comp", "list")
                    .query_param("include", "metadata")
                    .query_param("prefix", "bronze")
                    .query_param("maxresults", "2")
                    .query_param_missing("marker")
                    .header("authorization", "Bearer token")
                    .header("x-ms-version", API_VERSION)
                    .header_exists("x-ms-date");
                then.status(200).body(
                    "<EnumerationResults><Blobs>\
                     <Blob><Name>bronze/document_1/a.pdf</Name>\
                     <Properties><Content-Length>12</Content-Length></Properties>\
                     <Metadata><copied>true</copied></Metadata></Blob>\
                     <Blob><Name>bronze/document_2/b.pdf</Name></Blob>\
                     </Blobs><NextMarker>page-2</NextMarker></EnumerationResults>",
                );
            });
            let second = server.mock(|when, then| {
                when.method(GET)
                    .path(CONTAINER)
                    .query_param("comp", "list")
                    .query_param("marker", "page-2");
                then.status(200).body(
                    "<EnumerationResults><Blobs>\
                     <Blob><Name>bronze/document_3/c.pdf</Name></Blob>\
                     </Blobs></EnumerationResults>",
                );
            });

            let entries = client(&server)
                .with_page_size(2)
                .list_objects("bronze")
                .await
                .unwrap();

            first.assert();
            second.assert();
            let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
            assert_eq!(
                keys,
                [
                    "bronze/document_1/a.pdf",
                    "bronze/document_2/b.pdf",
                    "bronze/document_3/c.pdf"
                ]
            );
            assert_eq!(entries[0].size, Some(12));
            assert_eq!(entries[0].metadata.get("copied").map(String::as_str), Some("true"));
        }

        #[tokio::test]
        async fn acquire_returns_lease_id() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(PUT)
                    .path(object_path("a.pdf"))
                    .query_param("comp", "lease")
                    .header("x-ms-lease-action", "acquire")
                    .header("x-ms-lease-duration", "-1");
                then.status(201).header("x-ms-lease-id", "lease-1");
            });

            let lease = client(&server).acquire_lease("a.pdf").await.unwrap();

            mock.assert();
            assert_eq!(lease.key(), "a.pdf");
            assert_eq!(lease.lease_id(), "lease-1");
        }

        #[tokio::test]
        async fn acquire_without_lease_id_fails() {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(PUT).path(object_path("a.pdf"));
                then.status(201);
            });

            let err = client(&server).acquire_lease("a.pdf").await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lease);
        }

        #[tokio::test]
        async fn held_lease_is_a_lease_error() {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(PUT).path(object_path("a.pdf"));
                then.status(409)
                    .header("x-ms-error-code", "LeaseAlreadyPresent")
                    .body("<Error><Code>LeaseAlreadyPresent</Code>\
                           <Message>There is already a lease present.</Message></Error>");
            });

            let err = client(&server).acquire_lease("a.pdf").await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lease);
            assert!(!err.is_retryable());
            assert!(err.to_string().contains("LeaseAlreadyPresent"));
        }

        #[tokio::test]
        async fn release_treats_missing_lease_as_released() {
            for (status, code) in [
                (404, None),
                (409, Some("LeaseNotPresentWithLeaseOperation")),
                (409, Some("LeaseIdMismatchWithLeaseOperation")),
            ] {
                let server = MockServer::start_async().await;
                let mock = server.mock(|when, then| {
                    when.method(PUT)
                        .path(object_path("a.pdf"))
                        .query_param("comp", "lease")
                        .header("x-ms-lease-action", "release")
                        .header("x-ms-lease-id", "lease-1");
                    let then = then.status(status);
                    if let Some(code) = code {
                        then.header("x-ms-error-code", code);
                    }
                });

                let lease = LeaseHandle::new("a.pdf", "lease-1");
                client(&server).release_lease(&lease).await.unwrap();
                mock.assert();
            }
        }

        #[tokio::test]
        async fn release_surfaces_other_conflicts() {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(PUT).path(object_path("a.pdf"));
                then.status(409).header("x-ms-error-code", "LeaseLost");
            });

            let lease = LeaseHandle::new("a.pdf", "lease-1");
            let err = client(&server).release_lease(&lease).await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::Lease);
        }

        #[tokio::test]
        async fn copy_reports_service_status() {
            let server = MockServer::start_async().await;
            let source = Url::parse("https://scrapers.blob.core.windows.net/datalake/a.pdf?sig=abc")
                .unwrap();
            let copied = server.mock(|when, then| {
                when.method(PUT)
                    .path(object_path("done.pdf"))
                    .header("x-ms-copy-source", source.as_str());
                then.status(202).header("x-ms-copy-status", "success");
            });
            server.mock(|when, then| {
                when.method(PUT).path(object_path("queued.pdf"));
                then.status(202);
            });
            server.mock(|when, then| {
                when.method(PUT).path(object_path("broken.pdf"));
                then.status(202).header("x-ms-copy-status", "failed");
            });

            let client = client(&server);
            assert_eq!(
                client.start_copy(&source, "done.pdf").await.unwrap(),
                CopyStatus::Success
            );
            copied.assert();
            assert_eq!(
                client.start_copy(&source, "queued.pdf").await.unwrap(),
                CopyStatus::Pending
            );
            assert_eq!(
                client.start_copy(&source, "broken.pdf").await.unwrap(),
                CopyStatus::Failed
            );
        }

        #[tokio::test]
        async fn metadata_write_carries_lease() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(PUT)
                    .path(object_path("a.pdf"))
                    .query_param("comp", "metadata")
                    .header("x-ms-lease-id", "lease-1")
                    .header("x-ms-meta-copied", "true")
                    .header("x-ms-meta-source", "scraper");
                then.status(200);
            });

            let metadata = Metadata::from([
                ("copied".to_owned(), "true".to_owned()),
                ("source".to_owned(), "scraper".to_owned()),
            ]);
            let lease = LeaseHandle::new("a.pdf", "lease-1");
            client(&server)
                .set_metadata("a.pdf", &metadata, Some(&lease))
                .await
                .unwrap();
            mock.assert();
        }

        #[tokio::test]
        async fn metadata_read_collects_meta_headers() {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(GET)
                    .path(object_path("a.pdf"))
                    .query_param("comp", "metadata");
                then.status(200)
                    .header("x-ms-meta-source", "scraper")
                    .header("x-ms-request-id", "req-1");
            });

            let metadata = client(&server).get_metadata("a.pdf").await.unwrap();
            assert_eq!(
                metadata,
                Metadata::from([("source".to_owned(), "scraper".to_owned())])
            );
        }

        #[tokio::test]
        async fn statuses_map_to_error_kinds() {
            let server = MockServer::start_async().await;
            for (key, status) in [
                ("forbidden.pdf", 403),
                ("busy.pdf", 503),
                ("gone.pdf", 404),
                ("bad.pdf", 400),
            ] {
                server.mock(|when, then| {
                    when.method(GET).path(object_path(key));
                    then.status(status);
                });
            }

            let client = client(&server);
            let kind = |key: &'static str| {
                let client = client.clone();
                async move { client.get_metadata(key).await.unwrap_err().kind }
            };
            assert_eq!(kind("forbidden.pdf").await, ErrorKind::Authentication);
            assert_eq!(kind("busy.pdf").await, ErrorKind::ServiceUnavailable);
            assert_eq!(kind("gone.pdf").await, ErrorKind::NotFound);
            assert_eq!(kind("bad.pdf").await, ErrorKind::Metadata);
        }

        #[tokio::test]
        async fn unreachable_container_fails_verification() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(GET)
                    .path(CONTAINER)
                    .query_param("restype", "container");
                then.status(403).header("x-ms-error-code", "AuthorizationPermissionMismatch");
            });

            let err = client(&server).verify_reachable().await.unwrap_err();
            mock.assert();
            assert_eq!(err.kind, ErrorKind::Authentication);
        }

        #[tokio::test]
        async fn read_token_is_signed_with_delegation_key() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/devstoreaccount1")
                    .query_param("restype", "service")
                    .query_param("comp", "userdelegationkey")
                    .body_includes("<KeyInfo>");
                then.status(200).body(
                    "<UserDelegationKey>\
                     <SignedOid>11111111-1111-1111-1111-111111111111</SignedOid>\
                     <SignedTid>22222222-2222-2222-2222-222222222222</SignedTid>\
                     <SignedStart>2024-01-01T00:00:00Z</SignedStart>\
                     <SignedExpiry>2024-01-01T02:00:00Z</SignedExpiry>\
                     <SignedService>b</SignedService>\
                     <SignedVersion>2021-08-06</SignedVersion>\
                     <Value>AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=</Value>\
                     </UserDelegationKey>",
                );
            });

            let token = client(&server)
                .issue_read_token("bronze/a.pdf", Duration::from_secs(24 * 60 * 60))
                .await
                .unwrap();

            mock.assert();
            let query = token.query();
            assert!(query.contains("sp=r"));
            assert!(query.contains("sr=b"));
            assert!(query.contains("skoid=11111111-1111-1111-1111-111111111111"));
            assert!(query.contains("sig="));
            let limit = Timestamp::now()
                .checked_add(SignedDuration::from_secs(2 * 60 * 60))
                .unwrap();
            assert!(token.expires_at() <= limit);
            assert!(token.signed_url().path().ends_with("/datalake/bronze/a.pdf"));
        }

        #[tokio::test]
        async fn refused_delegation_is_authentication() {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(POST).path("/devstoreaccount1");
                then.status(400).header("x-ms-error-code", "AuthenticationFailed");
            });

            let err = client(&server)
                .issue_read_token("a.pdf", Duration::from_secs(60))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Authentication);
        }
    }
}
