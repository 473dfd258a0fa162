//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all catalog-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new client pointed at a test server
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Service Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Stats request failed")
    }

    /// GET /health
    pub async fn get_health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /v1/catalog/songs
    pub async fn get_songs(&self) -> Response {
        self.client
            .get(format!("{}/v1/catalog/songs", self.base_url))
            .send()
            .await
            .expect("Get songs request failed")
    }

    /// GET /v1/catalog/songs/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/songs/{}", self.base_url, id))
            .send()
            .await
            .expect("Get song request failed")
    }

    /// GET /v1/catalog/albums
    pub async fn get_albums(&self) -> Response {
        self.client
            .get(format!("{}/v1/catalog/albums", self.base_url))
            .send()
            .await
            .expect("Get albums request failed")
    }

    /// GET /v1/catalog/albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/albums/{}", self.base_url, id))
            .send()
            .await
            .expect("Get album request failed")
    }

    /// GET /v1/catalog/albums/{id}/songs
    pub async fn get_album_songs(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/albums/{}/songs", self.base_url, id))
            .send()
            .await
            .expect("Get album songs request failed")
    }

    /// GET /v1/catalog/artists
    pub async fn get_artists(&self) -> Response {
        self.client
            .get(format!("{}/v1/catalog/artists", self.base_url))
            .send()
            .await
            .expect("Get artists request failed")
    }

    /// GET /v1/catalog/artists/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/artists/{}", self.base_url, id))
            .send()
            .await
            .expect("Get artist request failed")
    }

    /// GET /v1/catalog/artists/{id}/songs
    pub async fn get_artist_songs(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/artists/{}/songs", self.base_url, id))
            .send()
            .await
            .expect("Get artist songs request failed")
    }

    /// GET /v1/catalog/genres
    pub async fn get_genres(&self) -> Response {
        self.client
            .get(format!("{}/v1/catalog/genres", self.base_url))
            .send()
            .await
            .expect("Get genres request failed")
    }

    /// GET /v1/catalog/genres/{id}
    pub async fn get_genre(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/genres/{}", self.base_url, id))
            .send()
            .await
            .expect("Get genre request failed")
    }

    /// GET /v1/catalog/genres/{id}/songs
    pub async fn get_genre_songs(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/catalog/genres/{}/songs", self.base_url, id))
            .send()
            .await
            .expect("Get genre songs request failed")
    }

    // ========================================================================
    // Cover Endpoints
    // ========================================================================

    /// GET /v1/covers/albums/{id}
    pub async fn get_album_covers(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/covers/albums/{}", self.base_url, id))
            .send()
            .await
            .expect("Get album covers request failed")
    }

    /// GET /v1/covers/artists/{id}
    pub async fn get_artist_covers(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/covers/artists/{}", self.base_url, id))
            .send()
            .await
            .expect("Get artist covers request failed")
    }

    /// GET /v1/covers/genres/{id}
    pub async fn get_genre_covers(&self, id: i64) -> Response {
        self.client
            .get(format!("{}/v1/covers/genres/{}", self.base_url, id))
            .send()
            .await
            .expect("Get genre covers request failed")
    }

    /// GET /v1/covers/most-common
    pub async fn get_most_common_covers(&self) -> Response {
        self.client
            .get(format!("{}/v1/covers/most-common", self.base_url))
            .send()
            .await
            .expect("Get most common covers request failed")
    }

    /// GET /v1/covers/most-common?limit={limit}
    pub async fn get_most_common_covers_with_limit(&self, limit: usize) -> Response {
        self.client
            .get(format!(
                "{}/v1/covers/most-common?limit={}",
                self.base_url, limit
            ))
            .send()
            .await
            .expect("Get most common covers request failed")
    }

    // ========================================================================
    // Scan Endpoint
    // ========================================================================

    /// POST /v1/scan
    pub async fn trigger_scan(&self) -> Response {
        self.client
            .post(format!("{}/v1/scan", self.base_url))
            .send()
            .await
            .expect("Scan request failed")
    }

    /// POST /v1/scan, asserting success and returning the report body
    ///
    /// # Panics
    ///
    /// Panics if the scan does not answer 200 (indicates test setup problem).
    pub async fn scan_ok(&self) -> serde_json::Value {
        let response = self.trigger_scan().await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Scan failed: {:?}",
            response.text().await
        );
        response.json().await.expect("Malformed scan report")
    }
}
