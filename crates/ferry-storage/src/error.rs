//! Structured error handling for blob store operations.

use hipstr::HipStr;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in blob store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Credential could not be obtained, was rejected, or could not be delegated.
    Authentication,
    /// Listing objects under a prefix failed.
    Listing,
    /// Lease acquisition or release conflicted with another holder.
    Lease,
    /// The backing service rejected a copy request.
    CopyInit,
    /// Reading or writing object metadata failed.
    Metadata,
    /// Container or object does not exist.
    NotFound,
    /// Network-related error occurred.
    Network,
    /// Timeout occurred.
    Timeout,
    /// Service throttled the request or is temporarily unavailable.
    ServiceUnavailable,
    /// Invalid endpoint, credential or client configuration.
    Configuration,
    /// Response body or header could not be decoded.
    Serialization,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Check if this error kind is typically retryable.
    ///
    /// Authentication failures are retried because delegated tokens and
    /// bearer tokens are short-lived and are re-issued on every attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Authentication | Self::Network | Self::Timeout | Self::ServiceUnavailable
        )
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<HipStr<'static>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information (object key, service error code).
    pub context: Option<HipStr<'static>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
            context: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    /// Creates a listing error.
    pub fn listing() -> Self {
        Self::new(ErrorKind::Listing)
    }

    /// Creates a lease error.
    pub fn lease() -> Self {
        Self::new(ErrorKind::Lease)
    }

    /// Creates a copy initiation error.
    pub fn copy_init() -> Self {
        Self::new(ErrorKind::CopyInit)
    }

    /// Creates a metadata error.
    pub fn metadata() -> Self {
        Self::new(ErrorKind::Metadata)
    }

    /// Creates a not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates a network error.
    pub fn network() -> Self {
        Self::new(ErrorKind::Network)
    }

    /// Creates a timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a serialization error.
    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<HipStr<'static>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<HipStr<'static>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout()
                .with_message(error.to_string())
                .with_source(error)
        } else if error.is_connect() {
            Self::network()
                .with_message("Connection failed")
                .with_source(error)
        } else if error.is_decode() {
            Self::serialization()
                .with_message(error.to_string())
                .with_source(error)
        } else {
            Self::network()
                .with_message(error.to_string())
                .with_source(error)
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::from_source(ErrorKind::Configuration, error).with_message("Invalid URL")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::Unknown);
        assert_eq!(error.kind, ErrorKind::Unknown);
        assert!(error.message.is_none());
        assert!(error.source.is_none());
        assert!(error.context.is_none());
    }

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::lease()
            .with_message("lease already present")
            .with_context("bronze/doc_1/a.pdf");

        assert_eq!(error.kind, ErrorKind::Lease);
        assert_eq!(error.message.as_deref(), Some("lease already present"));
        assert_eq!(error.context.as_deref(), Some("bronze/doc_1/a.pdf"));
    }

    #[test]
    fn test_error_display() {
        let error = Error::copy_init().with_message("target rejected copy");

        let display_str = error.to_string();
        assert!(display_str.contains("copy_init"));
        assert!(display_str.contains("target rejected copy"));
    }

    #[test]
    fn test_error_display_without_message() {
        assert_eq!(Error::not_found().to_string(), "[not_found]");
    }

    #[test]
    fn test_url_parse_error() {
        let error = Error::from(url::Url::parse("not a url").unwrap_err());
        assert_eq!(error.kind, ErrorKind::Configuration);
        assert!(error.source.is_some());
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("copy_init").unwrap(),
            ErrorKind::CopyInit
        );
        assert_eq!(
            ErrorKind::from_str("service_unavailable").unwrap(),
            ErrorKind::ServiceUnavailable
        );
        assert!(ErrorKind::from_str("invalid").is_err());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Authentication.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::ServiceUnavailable.is_retryable());

        assert!(!ErrorKind::Lease.is_retryable());
        assert!(!ErrorKind::CopyInit.is_retryable());
        assert!(!ErrorKind::Listing.is_retryable());
        assert!(!ErrorKind::Metadata.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Unknown.is_retryable());
    }

    #[test]
    fn test_default() {
        assert_eq!(ErrorKind::default(), ErrorKind::Unknown);
    }
}
