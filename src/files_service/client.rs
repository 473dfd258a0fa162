//! HTTP client for the external music-files service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::models::{AudioFileRef, FileCoverResponse, RankCoversRequest, RankCoversResponse};
use super::AudioFilesService;

const REQUEST_TIMEOUT_SEC: u64 = 10;

/// HTTP client for communicating with the music-files service.
pub struct HttpFilesClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFilesClient {
    /// Create a new files service client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the files service (e.g., "http://localhost:4444")
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    /// Get the base URL of the files service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AudioFilesService for HttpFilesClient {
    async fn list_audio_files(&self) -> Result<Vec<AudioFileRef>> {
        let url = format!("{}/v1/files", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to files service")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to list audio files: status {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse audio files listing")
    }

    async fn get_audio_file(&self, id: i64) -> Result<Option<AudioFileRef>> {
        let url = format!("{}/v1/files/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch audio file {}", id))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch audio file {}: status {}",
                id,
                response.status()
            );
        }

        let file: AudioFileRef = response
            .json()
            .await
            .context("Failed to parse audio file")?;
        Ok(Some(file))
    }

    async fn download_audio_file(&self, id: i64) -> Result<Vec<u8>> {
        let url = format!("{}/v1/files/{}/content", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to download audio file {}", id))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to download audio file {}: status {}",
                id,
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read audio file body")?;
        Ok(bytes.to_vec())
    }

    async fn rank_covers(&self, audio_file_ids: &[i64]) -> Result<Vec<i64>> {
        let url = format!("{}/v1/covers/rank", self.base_url);
        let request = RankCoversRequest {
            audio_file_ids: audio_file_ids.to_vec(),
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to files service for cover ranking")?;

        if !response.status().is_success() {
            anyhow::bail!("Cover ranking failed: status {}", response.status());
        }

        match response.json::<RankCoversResponse>().await {
            Ok(ranked) => Ok(ranked.cover_ids),
            Err(e) => {
                warn!("Malformed cover ranking response: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn get_cover(&self, audio_file_id: i64) -> Result<Option<i64>> {
        let url = format!("{}/v1/files/{}/cover", self.base_url, audio_file_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch cover of audio file {}", audio_file_id))?;

        // 404 means the file has no cover
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch cover of audio file {}: status {}",
                audio_file_id,
                response.status()
            );
        }

        let cover: FileCoverResponse = response
            .json()
            .await
            .context("Failed to parse cover response")?;
        Ok(Some(cover.cover_id))
    }
}
