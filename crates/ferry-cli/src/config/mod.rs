//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── accounts: AccountConfig       # Source and target account URLs
//! ├── transfer: TransferSpec        # Containers, prefixes, name filter
//! ├── options: TransferOptions      # Retries, token TTL, marker name
//! ├── http: AzureBlobConfig         # HTTP timeout, user agent
//! └── credentials: CredentialConfig # Bearer token or service principal
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod accounts;

use std::process;

use clap::Parser;
use ferry_storage::azure::{AzureBlobConfig, CredentialConfig};
use ferry_transfer::{TransferOptions, TransferSpec};
use serde::{Deserialize, Serialize};

pub use self::accounts::AccountConfig;
use crate::TRACING_TARGET_CONFIG;
use crate::telemetry::LogFormat;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "ferry")]
#[command(about = "Copy filtered documents between Azure Blob Storage containers")]
#[command(version)]
pub struct Cli {
    /// Storage account addresses.
    #[clap(flatten)]
    pub accounts: AccountConfig,

    /// What to transfer.
    #[clap(flatten)]
    pub transfer: TransferSpec,

    /// Retry, token and marker settings.
    #[clap(flatten)]
    pub options: TransferOptions,

    /// HTTP client settings.
    #[clap(flatten)]
    pub http: AzureBlobConfig,

    /// Azure credentials.
    #[clap(flatten)]
    pub credentials: CredentialConfig,

    /// Log output format
    #[arg(long, env = "FERRY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Exit with an error when any object fails to transfer
    #[arg(long, env = "FERRY_STRICT")]
    #[serde(default)]
    pub strict: bool,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            source_account = %self.accounts.source_account_url,
            source_container = %self.transfer.source_container,
            source_prefix = %self.transfer.source_prefix,
            target_account = %self.accounts.target_account_url,
            target_container = %self.transfer.target_container,
            target_prefix = %self.transfer.target_prefix,
            name_filter = %self.transfer.name_filter,
            "Transfer configuration"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            max_attempts = self.options.max_attempts,
            retry_delay_secs = self.options.retry_delay_secs,
            read_token_ttl_secs = self.options.read_token_ttl_secs,
            marker_key = %self.options.marker_key,
            http_timeout_secs = self.http.request_timeout_secs,
            list_page_size = self.http.page_size(),
            static_token = self.credentials.access_token.is_some(),
            strict = self.strict,
            "Run options"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 9] = [
        "ferry",
        "--source-account-url",
        "https://scrapers.blob.core.windows.net/",
        "--target-account-url",
        "https://auctionsdocuments.blob.core.windows.net/",
        "--source-container",
        "datalake",
        "--target-container",
        "poland-auctions-documents",
    ];

    #[test]
    fn parses_required_arguments_with_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();

        assert_eq!(cli.transfer.source_container, "datalake");
        assert_eq!(cli.transfer.source_prefix, "");
        assert_eq!(cli.options.max_attempts, 3);
        assert_eq!(cli.options.retry_delay_secs, 2);
        assert_eq!(cli.http.request_timeout_secs, 30);
        assert_eq!(cli.http.list_page_size, 5000);
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(!cli.strict);
    }

    #[test]
    fn parses_full_transfer() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--source-prefix",
            "bronze/poland/english/komornik/document",
            "--target-prefix",
            "auction_notice_documents",
            "--name-filter",
            "Treść obwieszczenia o e-licytacji (pdf)",
            "--max-attempts",
            "5",
            "--log-format",
            "json",
            "--strict",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(
            cli.transfer.name_filter,
            "Treść obwieszczenia o e-licytacji (pdf)"
        );
        assert_eq!(cli.options.max_attempts, 5);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.strict);
    }

    #[test]
    fn rejects_invalid_account_url() {
        let mut args = REQUIRED.to_vec();
        args[2] = "not a url";
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn requires_containers() {
        assert!(Cli::try_parse_from(REQUIRED[..5].iter().copied()).is_err());
    }

    #[test]
    fn cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
