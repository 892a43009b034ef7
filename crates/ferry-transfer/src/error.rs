//! Transfer error types.

use ferry_storage::types::CopyStatus;
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::stage::TransferStage;

/// Result type alias for transfer operations.
pub type Result<T, E = TransferError> = std::result::Result<T, E>;

/// Which side of a transfer a store serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreRole {
    Source,
    Target,
}

/// Transfer error type.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// The transfer spec failed validation.
    #[error("invalid transfer spec: {0}")]
    InvalidSpec(#[from] validator::ValidationErrors),

    /// A store could not be constructed, authenticated or reached.
    #[error("cannot connect to {role} store: {source}")]
    Connect {
        role: StoreRole,
        #[source]
        source: ferry_storage::Error,
    },

    /// Listing the source prefix failed; the run cannot start.
    #[error("listing failed: {0}")]
    Listing(#[source] ferry_storage::Error),

    /// The target name could not be derived from the source key.
    #[error("malformed key {key:?}: {reason}")]
    MalformedKey { key: String, reason: &'static str },

    /// A store operation failed during a per-object attempt.
    #[error("{key}: {stage} failed: {source}")]
    Attempt {
        key: String,
        stage: TransferStage,
        #[source]
        source: ferry_storage::Error,
    },

    /// The target reported the copy as failed or aborted.
    #[error("{key}: copy not accepted ({status})")]
    CopyNotAccepted { key: String, status: CopyStatus },

    /// Every attempt failed with a retryable error.
    #[error("{key}: gave up after {attempts} attempts: {last}")]
    Exhausted {
        key: String,
        attempts: u32,
        #[source]
        last: Box<TransferError>,
    },

    /// A non-retryable error ended the object after earlier retryable failures.
    #[error("{key}: failed on attempt {attempts}: {last}")]
    Fatal {
        key: String,
        attempts: u32,
        #[source]
        last: Box<TransferError>,
    },

    /// Some objects failed; raised only by callers that ask for it.
    #[error("{failed} object(s) failed to transfer")]
    Incomplete { failed: usize },
}

impl TransferError {
    /// Creates a malformed key error.
    pub fn malformed_key(key: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedKey {
            key: key.into(),
            reason,
        }
    }

    /// Creates an attempt error for `key` failing at `stage`.
    pub fn attempt(key: impl Into<String>, stage: TransferStage, source: ferry_storage::Error) -> Self {
        Self::Attempt {
            key: key.into(),
            stage,
            source,
        }
    }

    /// Whether another attempt at the same object may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Attempt { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Object key the error belongs to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MalformedKey { key, .. }
            | Self::Attempt { key, .. }
            | Self::CopyNotAccepted { key, .. }
            | Self::Exhausted { key, .. }
            | Self::Fatal { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Stage at which the object failed, if known.
    pub fn stage(&self) -> Option<TransferStage> {
        match self {
            Self::Attempt { stage, .. } => Some(*stage),
            Self::CopyNotAccepted { .. } => Some(TransferStage::CopyStarted),
            Self::Exhausted { last, .. } | Self::Fatal { last, .. } => last.stage(),
            _ => None,
        }
    }

    /// Number of attempts made before this error was returned.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Fatal { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use ferry_storage::{Error, ErrorKind};

    use super::*;

    #[test]
    fn retryable_follows_storage_kind() {
        let auth = TransferError::attempt("k", TransferStage::TokenIssued, Error::authentication());
        assert!(auth.is_retryable());

        let lease = TransferError::attempt("k", TransferStage::Leased, Error::lease());
        assert!(!lease.is_retryable());

        let rejected = TransferError::CopyNotAccepted {
            key: "k".into(),
            status: CopyStatus::Failed,
        };
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.stage(), Some(TransferStage::CopyStarted));
    }

    #[test]
    fn exhausted_reports_inner_stage() {
        let err = TransferError::Exhausted {
            key: "k".into(),
            attempts: 3,
            last: Box::new(TransferError::attempt(
                "k",
                TransferStage::CopyStarted,
                Error::new(ErrorKind::ServiceUnavailable),
            )),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.stage(), Some(TransferStage::CopyStarted));
        assert_eq!(err.key(), Some("k"));
        assert!(err.to_string().contains("gave up after 3 attempts"));
    }

    #[test]
    fn display_names_stage() {
        let err = TransferError::attempt("a.pdf", TransferStage::Marked, Error::metadata());
        assert_eq!(err.to_string(), "a.pdf: marked failed: [metadata]");
    }
}
