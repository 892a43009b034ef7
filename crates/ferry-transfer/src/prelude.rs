//! Convenience re-exports.

pub use crate::error::{Result, StoreRole, TransferError};
pub use crate::options::TransferOptions;
pub use crate::orchestrator::TransferOrchestrator;
pub use crate::report::{SkipReason, TransferReport};
pub use crate::service::IngestionService;
pub use crate::spec::TransferSpec;
