//! Input of one transfer run.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// What to move, from where, to where.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct TransferSpec {
    /// Container holding the source objects
    #[cfg_attr(
        feature = "config",
        arg(long = "source-container", env = "FERRY_SOURCE_CONTAINER")
    )]
    #[serde(alias = "source_container")]
    #[validate(length(min = 3, max = 63))]
    pub source_container: String,

    /// Key prefix to list in the source container
    #[cfg_attr(
        feature = "config",
        arg(long = "source-prefix", env = "FERRY_SOURCE_PREFIX", default_value = "")
    )]
    #[serde(default, alias = "source_prefix")]
    pub source_prefix: String,

    /// Container receiving the copies
    #[cfg_attr(
        feature = "config",
        arg(long = "target-container", env = "FERRY_TARGET_CONTAINER")
    )]
    #[serde(alias = "target_container")]
    #[validate(length(min = 3, max = 63))]
    pub target_container: String,

    /// Key prefix for the copies in the target container
    #[cfg_attr(
        feature = "config",
        arg(long = "target-prefix", env = "FERRY_TARGET_PREFIX", default_value = "")
    )]
    #[serde(default, alias = "target_prefix")]
    pub target_prefix: String,

    /// Only keys containing this text are transferred
    #[cfg_attr(
        feature = "config",
        arg(long = "name-filter", env = "FERRY_NAME_FILTER", default_value = "")
    )]
    #[serde(default, alias = "name_filter")]
    pub name_filter: String,
}

impl TransferSpec {
    /// Creates a spec copying everything between two containers.
    pub fn new(source_container: impl Into<String>, target_container: impl Into<String>) -> Self {
        Self {
            source_container: source_container.into(),
            source_prefix: String::new(),
            target_container: target_container.into(),
            target_prefix: String::new(),
            name_filter: String::new(),
        }
    }

    /// Sets the source listing prefix.
    pub fn with_source_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_prefix = prefix.into();
        self
    }

    /// Sets the target key prefix.
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = prefix.into();
        self
    }

    /// Sets the name filter substring.
    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = filter.into();
        self
    }
}
