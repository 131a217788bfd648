//! Adapters implementing the domain ports.

pub mod clock;
pub mod file_store;
pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
