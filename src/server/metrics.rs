use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::time::Duration;

use crate::reconciliation::SyncReport;

/// Metric name prefix for all Fonoteca metrics
const PREFIX: &str = "fonoteca";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Scan Metrics
    pub static ref SCANS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_scans_total"), "Total reconciliation scans by outcome"),
        &["outcome"]
    ).expect("Failed to create scans_total metric");

    pub static ref SCAN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_scan_duration_seconds"),
            "Reconciliation scan duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0])
    ).expect("Failed to create scan_duration_seconds metric");

    pub static ref SONGS_ADDED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_songs_added_total"),
        "Total songs added by reconciliation scans"
    ).expect("Failed to create songs_added_total metric");

    pub static ref SONGS_REMOVED_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_songs_removed_total"),
        "Total songs removed by reconciliation scans"
    ).expect("Failed to create songs_removed_total metric");

    // Catalog Metrics
    pub static ref CATALOG_ITEMS_TOTAL: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_catalog_items_total"), "Total items in catalog"),
        &["type"]
    ).expect("Failed to create catalog_items_total metric");

    // Cover Metrics
    pub static ref COVER_LOOKUP_FAILURES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_cover_lookup_failures_total"),
        "Total failed per-file cover lookups during aggregation"
    ).expect("Failed to create cover_lookup_failures_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SCANS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SCAN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(SONGS_ADDED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SONGS_REMOVED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ITEMS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COVER_LOOKUP_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Set the catalog item gauges to the current store counts.
pub fn update_catalog_items(
    num_songs: usize,
    num_albums: usize,
    num_artists: usize,
    num_genres: usize,
) {
    CATALOG_ITEMS_TOTAL
        .with_label_values(&["song"])
        .set(num_songs as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["album"])
        .set(num_albums as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["artist"])
        .set(num_artists as f64);

    CATALOG_ITEMS_TOTAL
        .with_label_values(&["genre"])
        .set(num_genres as f64);
}

/// Initialize catalog-specific metrics
pub fn init_catalog_metrics(
    num_songs: usize,
    num_albums: usize,
    num_artists: usize,
    num_genres: usize,
) {
    update_catalog_items(num_songs, num_albums, num_artists, num_genres);

    tracing::info!(
        "Catalog metrics initialized: {} songs, {} albums, {} artists, {} genres",
        num_songs,
        num_albums,
        num_artists,
        num_genres
    );
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a completed reconciliation scan
pub fn record_scan_success(duration: Duration, report: &SyncReport) {
    SCANS_TOTAL.with_label_values(&["success"]).inc();
    SCAN_DURATION_SECONDS.observe(duration.as_secs_f64());
    SONGS_ADDED_TOTAL.inc_by(report.added as f64);
    SONGS_REMOVED_TOTAL.inc_by(report.removed as f64);
}

/// Record a reconciliation scan that aborted with an error
pub fn record_scan_failure(duration: Duration) {
    SCANS_TOTAL.with_label_values(&["failure"]).inc();
    SCAN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed per-file cover lookup
pub fn record_cover_lookup_failure() {
    COVER_LOOKUP_FAILURES_TOTAL.inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // Parse the RSS (Resident Set Size) in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }

    // Fallback for non-Linux systems or if reading fails
    // We'll just not update the metric
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    // Update memory usage before returning metrics
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
