//! Tunables for a transfer run.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use ferry_storage::MAX_READ_TOKEN_TTL;
use serde::{Deserialize, Serialize};

use crate::marker::CopiedMarker;
use crate::retry::RetryPolicy;

/// Default number of attempts per object.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// Default lifetime of source read tokens, in seconds.
pub const DEFAULT_READ_TOKEN_TTL_SECS: u64 = 2 * 60 * 60;

/// Default metadata name of the copied marker.
pub const DEFAULT_MARKER_KEY: &str = "copied";

/// Retry, token and marker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct TransferOptions {
    /// Attempts per object before giving up
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-attempts",
            env = "FERRY_MAX_ATTEMPTS",
            default_value_t = DEFAULT_MAX_ATTEMPTS
        )
    )]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "retry-delay",
            env = "FERRY_RETRY_DELAY",
            default_value_t = DEFAULT_RETRY_DELAY_SECS
        )
    )]
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Lifetime of source read tokens in seconds (at most two hours)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "read-token-ttl",
            env = "FERRY_READ_TOKEN_TTL",
            default_value_t = DEFAULT_READ_TOKEN_TTL_SECS
        )
    )]
    #[serde(default = "default_read_token_ttl_secs")]
    pub read_token_ttl_secs: u64,

    /// Metadata name marking copied source objects
    #[cfg_attr(
        feature = "config",
        arg(long = "marker-key", env = "FERRY_MARKER_KEY", default_value = DEFAULT_MARKER_KEY)
    )]
    #[serde(default = "default_marker_key")]
    pub marker_key: String,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    DEFAULT_RETRY_DELAY_SECS
}

fn default_read_token_ttl_secs() -> u64 {
    DEFAULT_READ_TOKEN_TTL_SECS
}

fn default_marker_key() -> String {
    DEFAULT_MARKER_KEY.to_owned()
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            read_token_ttl_secs: DEFAULT_READ_TOKEN_TTL_SECS,
            marker_key: default_marker_key(),
        }
    }
}

impl TransferOptions {
    /// Sets the number of attempts per object.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts in seconds.
    #[must_use]
    pub fn with_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    /// Sets the read token lifetime in seconds.
    #[must_use]
    pub fn with_read_token_ttl_secs(mut self, secs: u64) -> Self {
        self.read_token_ttl_secs = secs;
        self
    }

    /// Sets the copied marker metadata name.
    #[must_use]
    pub fn with_marker_key(mut self, key: impl Into<String>) -> Self {
        self.marker_key = key.into();
        self
    }

    /// Retry policy for per-object attempts.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }

    /// Read token lifetime, capped at two hours.
    pub fn read_token_ttl(&self) -> Duration {
        Duration::from_secs(self.read_token_ttl_secs).min(MAX_READ_TOKEN_TTL)
    }

    /// Copied marker, falling back to the default name when unset.
    pub fn marker(&self) -> CopiedMarker {
        if self.marker_key.is_empty() {
            CopiedMarker::default()
        } else {
            CopiedMarker::new(self.marker_key.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = TransferOptions::default();
        assert_eq!(options.max_attempts, 3);
        assert_eq!(options.retry_policy().delay(), Duration::from_secs(2));
        assert_eq!(options.read_token_ttl(), Duration::from_secs(7200));
        assert_eq!(options.marker().name(), "copied");
    }

    #[test]
    fn ttl_is_capped() {
        let options = TransferOptions::default().with_read_token_ttl_secs(86_400);
        assert_eq!(options.read_token_ttl(), MAX_READ_TOKEN_TTL);
    }

    #[test]
    fn deserializes_partial_json() {
        let options: TransferOptions = serde_json::from_str(r#"{"max_attempts":5}"#).unwrap();
        assert_eq!(options.max_attempts, 5);
        assert_eq!(options.retry_delay_secs, DEFAULT_RETRY_DELAY_SECS);
        assert_eq!(options.marker_key, DEFAULT_MARKER_KEY);
    }
}
