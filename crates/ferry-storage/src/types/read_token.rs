//! Delegated read-only access to one object.

use jiff::Timestamp;
use url::Url;

/// Time-bounded, read-only credential scoped to a single object.
///
/// The query string carries the signature, so [`Debug`] never prints it.
#[derive(Clone)]
pub struct ReadToken {
    key: String,
    object_url: Url,
    query: String,
    expires_at: Timestamp,
}

impl ReadToken {
    /// Creates a token for `key` located at `object_url`.
    pub fn new(
        key: impl Into<String>,
        object_url: Url,
        query: impl Into<String>,
        expires_at: Timestamp,
    ) -> Self {
        Self {
            key: key.into(),
            object_url,
            query: query.into(),
            expires_at,
        }
    }

    /// Key of the object this token grants access to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Object URL without credentials.
    pub fn object_url(&self) -> &Url {
        &self.object_url
    }

    /// Raw query string carrying the delegated credential.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Instant after which the service rejects the token.
    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the token is already expired at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Self-contained object URL embedding the credential.
    pub fn signed_url(&self) -> Url {
        let mut url = self.object_url.clone();
        url.set_query(Some(&self.query));
        url
    }
}

impl std::fmt::Debug for ReadToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadToken")
            .field("key", &self.key)
            .field("object_url", &self.object_url.as_str())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
