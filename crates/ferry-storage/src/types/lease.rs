//! Exclusive lease handle.

/// Handle to an exclusive lease held on one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseHandle {
    key: String,
    lease_id: String,
}

impl LeaseHandle {
    /// Creates a handle for `key` identified by the service-issued `lease_id`.
    pub fn new(key: impl Into<String>, lease_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            lease_id: lease_id.into(),
        }
    }

    /// Key of the leased object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lease identifier issued by the service.
    pub fn lease_id(&self) -> &str {
        &self.lease_id
    }
}
