#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Azure Blob Storage backend.
pub mod azure;
mod error;
/// Blob store and connector traits.
pub mod store;
/// Data types (entries, endpoints, leases, tokens).
pub mod types;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use store::{BlobStore, Connector, MAX_READ_TOKEN_TTL};

#[doc(hidden)]
pub mod prelude;

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "ferry_storage";
