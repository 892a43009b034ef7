//! Scripted failures.

use ferry_storage::{Error, ErrorKind};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Store operation, used to script failures and inspect the call journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum StoreOperation {
    Verify,
    List,
    IssueReadToken,
    AcquireLease,
    ReleaseLease,
    StartCopy,
    GetMetadata,
    SetMetadata,
}

/// Failure injected into matching calls.
#[derive(Debug, Clone)]
pub(crate) struct Fault {
    operation: StoreOperation,
    kind: ErrorKind,
    key: Option<String>,
    /// Remaining failures; `None` fails forever.
    remaining: Option<usize>,
}

impl Fault {
    pub fn new(operation: StoreOperation, kind: ErrorKind) -> Self {
        Self {
            operation,
            kind,
            key: None,
            remaining: None,
        }
    }

    pub fn times(mut self, times: usize) -> Self {
        self.remaining = Some(times);
        self
    }

    pub fn for_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Consumes one failure if this fault applies to the call.
    pub fn trigger(&mut self, operation: StoreOperation, key: &str) -> Option<Error> {
        if self.operation != operation {
            return None;
        }
        if self.key.as_deref().is_some_and(|k| k != key) {
            return None;
        }
        match &mut self.remaining {
            Some(0) => return None,
            Some(n) => *n -= 1,
            None => {}
        }

        Some(
            Error::new(self.kind)
                .with_message(format!("injected {operation} failure"))
                .with_context(key.to_owned()),
        )
    }
}
