//! Client for the music-files service, the authoritative source of raw
//! audio files and their covers.

mod client;
mod models;

pub use client::HttpFilesClient;
pub use models::{AudioFileRef, FileCoverResponse, RankCoversRequest, RankCoversResponse};

use anyhow::Result;
use async_trait::async_trait;

/// Operations the catalog needs from the music-files service.
///
/// The production implementation is `HttpFilesClient`; tests substitute
/// hand-written fakes.
#[async_trait]
pub trait AudioFilesService: Send + Sync {
    /// List every audio file the service currently stores.
    async fn list_audio_files(&self) -> Result<Vec<AudioFileRef>>;

    /// One inventory entry by id, `None` when the service does not know it.
    async fn get_audio_file(&self, id: i64) -> Result<Option<AudioFileRef>>;

    /// Fetch the raw bytes of one audio file.
    async fn download_audio_file(&self, id: i64) -> Result<Vec<u8>>;

    /// Rank the covers associated with the given audio files, best first.
    async fn rank_covers(&self, audio_file_ids: &[i64]) -> Result<Vec<i64>>;

    /// Cover attached to a single audio file, `None` when it has none.
    async fn get_cover(&self, audio_file_id: i64) -> Result<Option<i64>>;
}
