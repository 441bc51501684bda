//! Durable media storage.
//!
//! [`ObjectStore`] abstracts the blob backend (S3-compatible in
//! production, in-memory in tests); [`MediaArchiver`] re-hosts transient
//! provider URLs into it.

pub mod archiver;
pub mod object_store;

pub use archiver::MediaArchiver;
pub use object_store::{MemoryObjectStore, ObjectStore, S3ObjectStore, StorageError};
