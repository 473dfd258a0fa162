//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{seed_standard_inventory, StubFilesService, TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_scan_seeded_inventory() {
//!     let files = StubFilesService::spawn().await;
//!     seed_standard_inventory(&files);
//!     let server = TestServer::spawn(&files.base_url).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.trigger_scan().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;
mod stub_files;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use fixtures::{corrupt_bytes, flac_bytes, seed_standard_inventory, TagSpec};
pub use server::TestServer;
pub use stub_files::StubFilesService;
