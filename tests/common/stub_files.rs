//! In-process stand-in for the music files service
//!
//! End-to-end tests point the catalog server at this stub instead of a
//! real files service deployment. Tests mutate the inventory between
//! scans through the handle's methods.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use fonoteca_catalog_server::files_service::{
    AudioFileRef, FileCoverResponse, RankCoversRequest, RankCoversResponse,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct StubState {
    files: Vec<(AudioFileRef, Vec<u8>)>,
    covers: HashMap<i64, i64>,
    ranking: Vec<i64>,
    rank_requests: Vec<Vec<i64>>,
    listing_down: bool,
    ranking_down: bool,
    covers_down: bool,
}

type SharedState = Arc<Mutex<StubState>>;

/// Handle to a spawned stub files service.
///
/// When dropped, the stub shuts down gracefully.
pub struct StubFilesService {
    /// Base URL the catalog server should be configured with
    pub base_url: String,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl StubFilesService {
    /// Spawns the stub on a random port with an empty inventory.
    pub async fn spawn() -> Self {
        let state = SharedState::default();

        let app = Router::new()
            .route("/v1/files", get(list_files))
            .route("/v1/files/{id}", get(get_file))
            .route("/v1/files/{id}/content", get(file_content))
            .route("/v1/files/{id}/cover", get(file_cover))
            .route("/v1/covers/rank", post(rank_covers))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub files service");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Stub files service failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Adds a file, or replaces its bytes and content hash if the id exists.
    pub fn put_file(&self, id: i64, content_hash: &str, bytes: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        let reference = AudioFileRef {
            id,
            content_hash: content_hash.to_string(),
            last_update: Utc::now(),
        };
        match state.files.iter_mut().find(|(r, _)| r.id == id) {
            Some(entry) => *entry = (reference, bytes),
            None => state.files.push((reference, bytes)),
        }
    }

    /// Drops a file from the inventory.
    pub fn remove_file(&self, id: i64) {
        self.state.lock().unwrap().files.retain(|(r, _)| r.id != id);
    }

    /// Attaches a cover to a file. Files without one answer 404.
    pub fn set_cover(&self, audio_file_id: i64, cover_id: i64) {
        self.state
            .lock()
            .unwrap()
            .covers
            .insert(audio_file_id, cover_id);
    }

    /// Fixes what the ranking endpoint responds with.
    pub fn set_ranking(&self, cover_ids: Vec<i64>) {
        self.state.lock().unwrap().ranking = cover_ids;
    }

    /// Request bodies the ranking endpoint has received so far.
    pub fn rank_requests(&self) -> Vec<Vec<i64>> {
        self.state.lock().unwrap().rank_requests.clone()
    }

    /// Makes the inventory listing endpoint answer 500.
    pub fn break_listing(&self) {
        self.state.lock().unwrap().listing_down = true;
    }

    /// Makes the ranking endpoint answer 500.
    pub fn break_ranking(&self) {
        self.state.lock().unwrap().ranking_down = true;
    }

    /// Makes the per-file cover endpoint answer 500.
    pub fn break_covers(&self) {
        self.state.lock().unwrap().covers_down = true;
    }
}

impl Drop for StubFilesService {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn list_files(State(state): State<SharedState>) -> Response {
    let state = state.lock().unwrap();
    if state.listing_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let refs: Vec<AudioFileRef> = state.files.iter().map(|(r, _)| r.clone()).collect();
    Json(refs).into_response()
}

async fn get_file(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    match state.files.iter().find(|(r, _)| r.id == id) {
        Some((reference, _)) => Json(reference.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn file_content(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    match state.files.iter().find(|(r, _)| r.id == id) {
        Some((_, bytes)) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn file_cover(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    if state.covers_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match state.covers.get(&id) {
        Some(&cover_id) => Json(FileCoverResponse { cover_id }).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn rank_covers(
    State(state): State<SharedState>,
    Json(request): Json<RankCoversRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    if state.ranking_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    state.rank_requests.push(request.audio_file_ids);
    Json(RankCoversResponse {
        cover_ids: state.ranking.clone(),
    })
    .into_response()
}
