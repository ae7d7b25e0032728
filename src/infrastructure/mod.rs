//! Adapters implementing the domain ports.

pub mod challenge;
pub mod fees;
pub mod gateway;
pub mod in_memory;
pub mod mailer;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
