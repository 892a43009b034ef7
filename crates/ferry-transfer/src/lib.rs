#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod lease;
pub mod marker;
pub mod naming;
mod options;
mod orchestrator;
mod report;
pub mod retry;
mod service;
mod spec;
mod stage;
mod ticket;

pub use error::{Result, StoreRole, TransferError};
pub use marker::CopiedMarker;
pub use options::{
    DEFAULT_MARKER_KEY, DEFAULT_MAX_ATTEMPTS, DEFAULT_READ_TOKEN_TTL_SECS,
    DEFAULT_RETRY_DELAY_SECS, TransferOptions,
};
pub use orchestrator::TransferOrchestrator;
pub use report::{FailedObject, SkipReason, SkippedObject, TransferReport, TransferredObject};
pub use retry::RetryPolicy;
pub use service::IngestionService;
pub use spec::TransferSpec;
pub use stage::TransferStage;
pub use ticket::CopyTicket;

#[doc(hidden)]
pub mod prelude;

/// Tracing target for transfer runs.
pub const TRACING_TARGET: &str = "ferry_transfer";
