use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::{error, info};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, metrics, state::*, RequestsLoggingLevel, ServerConfig};
use crate::catalog_store::Song;
use crate::covers::CoverError;

/// Default number of cover ids returned by the most-common endpoint.
const DEFAULT_MOST_COMMON_COVERS: usize = 4;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub songs_count: usize,
    pub albums_count: usize,
    pub artists_count: usize,
    pub genres_count: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Serialize)]
struct CoverIdsResponse {
    cover_ids: Vec<i64>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize, Debug)]
struct MostCommonCoversQuery {
    limit: Option<usize>,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        songs_count: state.catalog_store.get_songs_count(),
        albums_count: state.catalog_store.get_albums_count(),
        artists_count: state.catalog_store.get_artists_count(),
        genres_count: state.catalog_store.get_genres_count(),
    };
    Json(stats)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ===== Catalog routes =====

async fn get_song(State(catalog): State<GuardedCatalogStore>, Path(id): Path<i64>) -> Response {
    match catalog.get_song(id) {
        Ok(Some(song)) => Json(song).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_all_songs(State(catalog): State<GuardedCatalogStore>) -> Response {
    match catalog.get_all_songs() {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_album(State(catalog): State<GuardedCatalogStore>, Path(id): Path<i64>) -> Response {
    match catalog.get_album(id) {
        Ok(Some(album)) => Json(album).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_all_albums(State(catalog): State<GuardedCatalogStore>) -> Response {
    match catalog.get_all_albums() {
        Ok(albums) => Json(albums).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_album_songs(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.get_album(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    match catalog.get_album_songs(id) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_artist(State(catalog): State<GuardedCatalogStore>, Path(id): Path<i64>) -> Response {
    match catalog.get_artist(id) {
        Ok(Some(artist)) => Json(artist).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_all_artists(State(catalog): State<GuardedCatalogStore>) -> Response {
    match catalog.get_all_artists() {
        Ok(artists) => Json(artists).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_artist_songs(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.get_artist(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    match catalog.get_artist_songs(id) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_genre(State(catalog): State<GuardedCatalogStore>, Path(id): Path<i64>) -> Response {
    match catalog.get_genre(id) {
        Ok(Some(genre)) => Json(genre).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_all_genres(State(catalog): State<GuardedCatalogStore>) -> Response {
    match catalog.get_all_genres() {
        Ok(genres) => Json(genres).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

async fn get_genre_songs(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.get_genre(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    match catalog.get_genre_songs(id) {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response(),
    }
}

// ===== Cover routes =====

async fn rank_covers_response(state: &ServerState, songs: &[Song]) -> Response {
    match state.cover_aggregator.rank_top_covers(songs).await {
        Ok(cover_ids) => Json(CoverIdsResponse { cover_ids }).into_response(),
        Err(CoverError::EmptyAggregation) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "no cover data".to_string(),
            }),
        )
            .into_response(),
        Err(CoverError::Upstream(err)) => {
            error!("Cover ranking failed: {:#}", err);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn get_album_covers(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    match state.catalog_store.get_album(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    let songs = match state.catalog_store.get_album_songs(id) {
        Ok(songs) => songs,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    };
    rank_covers_response(&state, &songs).await
}

async fn get_artist_covers(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    match state.catalog_store.get_artist(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    let songs = match state.catalog_store.get_artist_songs(id) {
        Ok(songs) => songs,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    };
    rank_covers_response(&state, &songs).await
}

async fn get_genre_covers(State(state): State<ServerState>, Path(id): Path<i64>) -> Response {
    match state.catalog_store.get_genre(id) {
        Ok(Some(_)) => {}
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    }
    let songs = match state.catalog_store.get_genre_songs(id) {
        Ok(songs) => songs,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    };
    rank_covers_response(&state, &songs).await
}

async fn get_most_common_covers(
    State(state): State<ServerState>,
    Query(query): Query<MostCommonCoversQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_MOST_COMMON_COVERS);
    let songs = match state.catalog_store.get_all_songs() {
        Ok(songs) => songs,
        Err(err) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", err)).into_response()
        }
    };
    match state.cover_aggregator.most_common_cover_ids(&songs, limit).await {
        Ok(cover_ids) => Json(CoverIdsResponse { cover_ids }).into_response(),
        Err(CoverError::EmptyAggregation) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "no cover data".to_string(),
            }),
        )
            .into_response(),
        Err(CoverError::Upstream(err)) => {
            error!("Cover aggregation failed: {:#}", err);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

// ===== Scan route =====

async fn post_scan(State(state): State<ServerState>) -> Response {
    // One scan at a time. A second request gets a 409 instead of waiting.
    let _guard = match state.scan_guard.try_lock() {
        Ok(guard) => guard,
        Err(_) => return StatusCode::CONFLICT.into_response(),
    };

    let start = Instant::now();
    match state.reconciler.sync().await {
        Ok(report) => {
            metrics::record_scan_success(start.elapsed(), &report);
            metrics::update_catalog_items(
                state.catalog_store.get_songs_count(),
                state.catalog_store.get_albums_count(),
                state.catalog_store.get_artists_count(),
                state.catalog_store.get_genres_count(),
            );
            Json(report).into_response()
        }
        Err(err) => {
            error!("Scan failed: {:#}", err);
            metrics::record_scan_failure(start.elapsed());
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        reconciler: GuardedReconciler,
        cover_aggregator: GuardedCoverAggregator,
        scan_guard: ScanGuard,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            reconciler,
            cover_aggregator,
            scan_guard,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    reconciler: GuardedReconciler,
    cover_aggregator: GuardedCoverAggregator,
    scan_guard: ScanGuard,
) -> Result<Router> {
    let state = ServerState::new(config, catalog_store, reconciler, cover_aggregator, scan_guard);

    let catalog_routes: Router = Router::new()
        .route("/songs", get(get_all_songs))
        .route("/songs/{id}", get(get_song))
        .route("/albums", get(get_all_albums))
        .route("/albums/{id}", get(get_album))
        .route("/albums/{id}/songs", get(get_album_songs))
        .route("/artists", get(get_all_artists))
        .route("/artists/{id}", get(get_artist))
        .route("/artists/{id}/songs", get(get_artist_songs))
        .route("/genres", get(get_all_genres))
        .route("/genres/{id}", get(get_genre))
        .route("/genres/{id}/songs", get(get_genre_songs))
        .with_state(state.clone());

    let covers_routes: Router = Router::new()
        .route("/albums/{id}", get(get_album_covers))
        .route("/artists/{id}", get(get_artist_covers))
        .route("/genres/{id}", get(get_genre_covers))
        .route("/most-common", get(get_most_common_covers))
        .with_state(state.clone());

    let scan_routes: Router = Router::new()
        .route("/scan", post(post_scan))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .with_state(state.clone())
        .nest("/v1/catalog", catalog_routes)
        .nest("/v1/covers", covers_routes)
        .nest("/v1", scan_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    catalog_store: GuardedCatalogStore,
    reconciler: GuardedReconciler,
    cover_aggregator: GuardedCoverAggregator,
    scan_guard: ScanGuard,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
    };
    let app = make_app(config, catalog_store, reconciler, cover_aggregator, scan_guard)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Serving catalog on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
