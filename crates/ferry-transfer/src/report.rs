//! Outcome of one transfer run.

use ferry_storage::types::CopyStatus;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::error::{Result, TransferError};
use crate::stage::TransferStage;

/// Why an object was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The source object already carries the copied marker.
    AlreadyCopied,
    /// No target name could be derived from the key.
    MalformedKey,
}

/// Object whose copy was accepted and marked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredObject {
    pub source_key: String,
    pub target_key: String,
    pub status: CopyStatus,
    pub attempts: u32,
}

/// Object that failed after its attempts ran out or hit a fatal error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<TransferStage>,
    pub reason: String,
    pub attempts: u32,
}

impl FailedObject {
    /// Records `error` against `key`.
    pub fn from_error(key: impl Into<String>, error: &TransferError) -> Self {
        Self {
            key: key.into(),
            stage: error.stage(),
            reason: error.to_string(),
            attempts: error.attempts(),
        }
    }
}

/// Object the run did not attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedObject {
    pub key: String,
    pub reason: SkipReason,
}

/// Per-object results of a run.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Keys returned by the listing that matched the name filter.
    pub matched: usize,
    pub succeeded: Vec<TransferredObject>,
    pub failed: Vec<FailedObject>,
    pub skipped: Vec<SkippedObject>,
}

impl TransferReport {
    /// Objects a copy was attempted for.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Number of objects copied and marked.
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    /// Number of objects that failed.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of objects skipped.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Whether no object failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Keys of failed objects, in processing order.
    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.key.as_str())
    }

    /// Turns per-object failures into [`TransferError::Incomplete`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(TransferError::Incomplete {
                failed: self.failed.len(),
            })
        }
    }

    pub(crate) fn record_success(&mut self, object: TransferredObject) {
        self.succeeded.push(object);
    }

    pub(crate) fn record_failure(&mut self, object: FailedObject) {
        self.failed.push(object);
    }

    pub(crate) fn record_skip(&mut self, key: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedObject {
            key: key.into(),
            reason,
        });
    }
}
