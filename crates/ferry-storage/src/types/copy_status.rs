//! Initial status reported by a server-side copy.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Status returned when a server-side copy is initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CopyStatus {
    /// Copy accepted and still running on the service.
    Pending,
    /// Copy completed synchronously.
    Success,
    /// Copy failed.
    Failed,
    /// Copy was aborted.
    Aborted,
}

impl CopyStatus {
    /// Whether the service accepted the copy request.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Pending | Self::Success)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn accepted_statuses() {
        assert!(CopyStatus::Pending.is_accepted());
        assert!(CopyStatus::Success.is_accepted());
        assert!(!CopyStatus::Failed.is_accepted());
        assert!(!CopyStatus::Aborted.is_accepted());
    }

    #[test]
    fn parses_service_header_values() {
        assert_eq!(CopyStatus::from_str("pending").unwrap(), CopyStatus::Pending);
        assert_eq!(CopyStatus::from_str("Success").unwrap(), CopyStatus::Success);
        assert!(CopyStatus::from_str("unknown").is_err());
    }
}
