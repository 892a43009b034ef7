//! Name filtering and target-name derivation.

use crate::error::{Result, TransferError};

/// Prefix of every derived target name.
pub const TARGET_NAME_PREFIX: &str = "auction_notice_pl_";

/// Extension of every derived target name.
pub const TARGET_NAME_EXTENSION: &str = ".pdf";

/// Whether `name` contains `substring` literally. An empty substring
/// matches everything.
pub fn matches_name(name: &str, substring: &str) -> bool {
    name.contains(substring)
}

/// Keeps the names containing `substring`, in input order.
pub fn filter_by_name<I, S>(names: I, substring: &str) -> Vec<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|name| matches_name(name.as_ref(), substring))
        .collect()
}

/// Derives the target file name from the folder holding `source_key`.
///
/// `bronze/poland/document_123/notice.pdf` becomes
/// `auction_notice_pl_123.pdf`: the reference is whatever follows the last
/// underscore of the second-to-last path segment.
pub fn derive_target_name(source_key: &str) -> Result<String> {
    let segments: Vec<&str> = source_key.split('/').collect();
    let Some(folder) = segments.len().checked_sub(2).map(|i| segments[i]) else {
        return Err(TransferError::malformed_key(
            source_key,
            "key has fewer than two path segments",
        ));
    };

    let Some((_, reference)) = folder.rsplit_once('_') else {
        return Err(TransferError::malformed_key(
            source_key,
            "folder segment has no underscore",
        ));
    };
    if reference.is_empty() {
        return Err(TransferError::malformed_key(
            source_key,
            "folder segment has an empty reference",
        ));
    }

    Ok(format!("{TARGET_NAME_PREFIX}{reference}{TARGET_NAME_EXTENSION}"))
}

/// Joins `target_prefix` and `name` into a target object key.
pub fn target_key(target_prefix: &str, name: &str) -> String {
    let prefix = target_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}
