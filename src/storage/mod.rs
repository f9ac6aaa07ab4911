//! Durable object storage: an S3-backed remote store behind the
//! [`ObjectStore`] trait, fronted by a local disk mirror.

/// Local disk mirror with cache-first reads
pub mod cache;
/// S3 client and the `ObjectStore` seam
pub mod remote;

pub use cache::ObjectCache;
pub use remote::{MockObjectStore, ObjectStore, RemoteStore, StorageError};
