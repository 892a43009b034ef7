//! Per-object transfer progress.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Progress of one object through a transfer attempt.
///
/// Errors carry the stage the attempt was moving into when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferStage {
    /// Object was returned by the listing and passed the filter.
    Listed,
    /// Exclusive lease held on the source object.
    Leased,
    /// Read token issued for the source object.
    TokenIssued,
    /// Target accepted the server-side copy.
    CopyStarted,
    /// Copied marker written to the source object.
    Marked,
    /// Lease released, attempt finished.
    Done,
}
