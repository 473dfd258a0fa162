//! Fonoteca Catalog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog_store;
pub mod config;
pub mod covers;
pub mod files_service;
pub mod reconciliation;
pub mod server;
pub mod sqlite_persistence;
pub mod tags;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use files_service::{AudioFilesService, HttpFilesClient};
pub use reconciliation::{Reconciler, SyncReport};
pub use server::{run_server, RequestsLoggingLevel};
pub use tags::{LoftyTagReader, TagReader};
