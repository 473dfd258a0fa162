use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog_store;
use catalog_store::{CatalogStore, SqliteCatalogStore};

mod config;
use config::{AppConfig, CliConfig, FileConfig};

mod covers;
use covers::CoverAggregator;

mod files_service;
use files_service::HttpFilesClient;

mod reconciliation;
use reconciliation::Reconciler;

mod server;
use server::{run_server, RequestsLoggingLevel};

mod sqlite_persistence;

mod tags;
use tags::LoftyTagReader;

const READ_POOL_SIZE: usize = 4;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(long, default_value = "./catalog.db", value_parser = parse_path)]
    pub db_path: PathBuf,

    /// Base URL of the music files service.
    #[clap(long)]
    pub files_service_url: Option<String>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3666)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping). Set to 0 to disable.
    #[clap(long, default_value_t = 9667)]
    pub metrics_port: u16,

    /// Minutes between automatic reconciliation scans. Set to 0 to disable.
    #[clap(long, default_value_t = 0)]
    pub scan_interval_minutes: u64,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub requests_logging: RequestsLoggingLevel,

    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_path: cli_args.db_path.clone(),
        port: cli_args.port,
        metrics_port: cli_args.metrics_port,
        files_service_url: cli_args.files_service_url.clone(),
        scan_interval_minutes: cli_args.scan_interval_minutes,
        requests_logging: cli_args.requests_logging.clone(),
    };
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "Opening SQLite catalog database at {:?}...",
        app_config.db_path
    );
    let catalog_store = Arc::new(SqliteCatalogStore::new(&app_config.db_path, READ_POOL_SIZE)?);

    // Initialize metrics system
    info!("Initializing metrics...");
    server::metrics::init_metrics();
    server::metrics::init_catalog_metrics(
        catalog_store.get_songs_count(),
        catalog_store.get_albums_count(),
        catalog_store.get_artists_count(),
        catalog_store.get_genres_count(),
    );

    info!(
        "Music files service configured at {}",
        app_config.files_service_url
    );
    let files_client = Arc::new(HttpFilesClient::new(app_config.files_service_url.clone()));

    let reconciler = Arc::new(Reconciler::new(
        catalog_store.clone(),
        files_client.clone(),
        Arc::new(LoftyTagReader),
    ));
    let cover_aggregator = Arc::new(CoverAggregator::new(files_client));
    let scan_guard = Arc::new(tokio::sync::Mutex::new(()));

    // Spawn background task for periodic scans if enabled
    if app_config.scan_interval_minutes > 0 {
        let interval_minutes = app_config.scan_interval_minutes;
        let scan_reconciler = reconciler.clone();
        let scan_store = catalog_store.clone();
        let task_guard = scan_guard.clone();

        info!("Periodic scans enabled: every {} minutes", interval_minutes);

        tokio::spawn(async move {
            let interval = Duration::from_secs(interval_minutes * 60);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick, wait for the first interval
            ticker.tick().await;

            loop {
                ticker.tick().await;

                // A manually triggered scan may be in flight; skip this round.
                let Ok(_guard) = task_guard.try_lock() else {
                    continue;
                };

                let start = std::time::Instant::now();
                match scan_reconciler.sync().await {
                    Ok(report) => {
                        server::metrics::record_scan_success(start.elapsed(), &report);
                        server::metrics::update_catalog_items(
                            scan_store.get_songs_count(),
                            scan_store.get_albums_count(),
                            scan_store.get_artists_count(),
                            scan_store.get_genres_count(),
                        );
                        info!("Periodic scan done: {:?}", report);
                    }
                    Err(e) => {
                        server::metrics::record_scan_failure(start.elapsed());
                        error!("Periodic scan failed: {:#}", e);
                    }
                }
            }
        });
    }

    // Serve Prometheus metrics on a dedicated port so the catalog API
    // and the scrape endpoint never share a listener.
    if app_config.metrics_port > 0 {
        let metrics_port = app_config.metrics_port;
        tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/metrics",
                axum::routing::get(server::metrics::metrics_handler),
            );
            match tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port)).await {
                Ok(listener) => {
                    if let Err(e) = axum::serve(listener, app).await {
                        error!("Metrics server failed: {}", e);
                    }
                }
                Err(e) => error!("Failed to bind metrics port {}: {}", metrics_port, e),
            }
        });
        info!("Metrics available at port {}!", app_config.metrics_port);
    }

    info!("Ready to serve at port {}!", app_config.port);
    run_server(
        catalog_store,
        reconciler,
        cover_aggregator,
        scan_guard,
        app_config.requests_logging,
        app_config.port,
    )
    .await
}
