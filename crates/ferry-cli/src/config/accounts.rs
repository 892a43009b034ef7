//! Storage account addresses.

use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Service root addresses of the source and target storage accounts.
///
/// # Environment Variables
///
/// - `FERRY_SOURCE_ACCOUNT_URL` - e.g. `https://scrapers.blob.core.windows.net/`
/// - `FERRY_TARGET_ACCOUNT_URL` - e.g. `https://auctionsdocuments.blob.core.windows.net/`
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Blob service URL of the source storage account
    #[arg(long, env = "FERRY_SOURCE_ACCOUNT_URL")]
    pub source_account_url: Url,

    /// Blob service URL of the target storage account
    #[arg(long, env = "FERRY_TARGET_ACCOUNT_URL")]
    pub target_account_url: Url,
}
