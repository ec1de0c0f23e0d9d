//! Application layer module
//!
//! Use cases that drive the domain through the infrastructure adapters.

pub mod catalog_sync;

pub use catalog_sync::{CatalogSyncService, SyncSummary};
