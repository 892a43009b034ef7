//! Resources held by one copy attempt.

use ferry_storage::types::{LeaseHandle, ReadToken};
use jiff::Timestamp;
use url::Url;

/// Lease and read token for copying one source object to one target key.
///
/// Lives for a single attempt; the lease it carries is released by the
/// enclosing [`with_lease`](crate::lease::with_lease) scope.
#[derive(Debug, Clone)]
pub struct CopyTicket {
    source_key: String,
    target_key: String,
    lease: LeaseHandle,
    token: ReadToken,
}

impl CopyTicket {
    /// Bundles the resources of one attempt.
    pub fn new(target_key: impl Into<String>, lease: LeaseHandle, token: ReadToken) -> Self {
        Self {
            source_key: lease.key().to_owned(),
            target_key: target_key.into(),
            lease,
            token,
        }
    }

    /// Source object key.
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Derived target key.
    pub fn target_key(&self) -> &str {
        &self.target_key
    }

    /// Lease held on the source object.
    pub fn lease(&self) -> &LeaseHandle {
        &self.lease
    }

    /// Self-contained source URL handed to the target for the copy.
    pub fn source_url(&self) -> Url {
        self.token.signed_url()
    }

    /// When the source URL stops granting access.
    pub fn expires_at(&self) -> Timestamp {
        self.token.expires_at()
    }
}
