//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test catalog servers.
//! Each test gets an isolated server with its own temporary database,
//! pointed at whatever files service URL the test provides.

use super::constants::*;
use fonoteca_catalog_server::catalog_store::SqliteCatalogStore;
use fonoteca_catalog_server::covers::CoverAggregator;
use fonoteca_catalog_server::files_service::HttpFilesClient;
use fonoteca_catalog_server::reconciliation::Reconciler;
use fonoteca_catalog_server::server::server::make_app;
use fonoteca_catalog_server::server::state::ScanGuard;
use fonoteca_catalog_server::server::{RequestsLoggingLevel, ServerConfig};
use fonoteca_catalog_server::tags::LoftyTagReader;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test catalog server with an isolated database
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Creates a fresh catalog database in a temp directory
    /// 2. Wires the reconciler and cover aggregator against `files_service_url`
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Database creation fails
    /// - Port binding fails
    /// - Server fails to start
    /// - Server doesn't become ready within timeout
    pub async fn spawn(files_service_url: &str) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("catalog.db");

        let catalog_store = Arc::new(
            SqliteCatalogStore::new(&db_path, TEST_READ_POOL_SIZE)
                .expect("Failed to open catalog store"),
        );

        let files_client = Arc::new(HttpFilesClient::new(files_service_url.to_string()));
        let reconciler = Arc::new(Reconciler::new(
            catalog_store.clone(),
            files_client.clone(),
            Arc::new(LoftyTagReader),
        ));
        let cover_aggregator = Arc::new(CoverAggregator::new(files_client));
        let scan_guard: ScanGuard = Arc::new(tokio::sync::Mutex::new(()));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
        };

        let app = make_app(config, catalog_store, reconciler, cover_aggregator, scan_guard)
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    // Server is ready
                    return;
                }
                _ => {
                    // Server not ready yet, wait and retry
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
