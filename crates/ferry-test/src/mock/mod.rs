//! In-memory [`BlobStore`](ferry_storage::BlobStore) and
//! [`Connector`](ferry_storage::Connector) doubles.

mod connector;
mod fault;
mod store;

pub use connector::MemoryConnector;
pub use fault::StoreOperation;
pub use store::{Call, MemoryStore};
