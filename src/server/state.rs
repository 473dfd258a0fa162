use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::covers::CoverAggregator;
use crate::reconciliation::Reconciler;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;
pub type GuardedReconciler = Arc<Reconciler>;
pub type GuardedCoverAggregator = Arc<CoverAggregator>;
/// Held while a scan runs. Handlers use `try_lock` so overlapping
/// scan requests are rejected instead of queued.
pub type ScanGuard = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub reconciler: GuardedReconciler,
    pub cover_aggregator: GuardedCoverAggregator,
    pub scan_guard: ScanGuard,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}

impl FromRef<ServerState> for GuardedReconciler {
    fn from_ref(input: &ServerState) -> Self {
        input.reconciler.clone()
    }
}

impl FromRef<ServerState> for GuardedCoverAggregator {
    fn from_ref(input: &ServerState) -> Self {
        input.cover_aggregator.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
