//! Data types exchanged with a [`BlobStore`](crate::BlobStore).

mod blob_entry;
mod copy_status;
mod endpoint;
mod lease;
mod read_token;

pub use blob_entry::{BlobEntry, Metadata};
pub use copy_status::CopyStatus;
pub use endpoint::StorageEndpoint;
pub use lease::LeaseHandle;
pub use read_token::ReadToken;
