//! Cover aggregation over catalog songs.
//!
//! Covers are owned and rendered by the music-files service; the catalog
//! only ever sees opaque integer ids.

use crate::catalog_store::Song;
use crate::files_service::AudioFilesService;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// How many per-file cover lookups run at once in `most_common_cover_ids`.
const COVER_LOOKUP_CONCURRENCY: usize = 8;

/// Errors surfaced by cover aggregation.
#[derive(Debug, Error)]
pub enum CoverError {
    /// The files service ranking call failed
    #[error("Files service unavailable: {0}")]
    Upstream(anyhow::Error),

    /// No song had a resolvable cover
    #[error("No cover data available")]
    EmptyAggregation,
}

/// Answers "which covers represent this set of songs best".
pub struct CoverAggregator {
    files: Arc<dyn AudioFilesService>,
}

impl CoverAggregator {
    pub fn new(files: Arc<dyn AudioFilesService>) -> Self {
        Self { files }
    }

    /// Send the songs' audio file ids to the files service ranking endpoint
    /// in one call and return its ordering verbatim.
    pub async fn rank_top_covers(&self, songs: &[Song]) -> Result<Vec<i64>, CoverError> {
        let audio_file_ids: Vec<i64> = songs.iter().map(|s| s.audio_file_id).collect();
        self.files
            .rank_covers(&audio_file_ids)
            .await
            .map_err(CoverError::Upstream)
    }

    /// Look up every song's cover and return the `n` most frequent cover
    /// ids, most frequent first.
    ///
    /// A failed lookup excludes that song from the count; equally frequent
    /// covers are ordered by ascending id. `EmptyAggregation` when no song
    /// resolved to a cover at all.
    pub async fn most_common_cover_ids(
        &self,
        songs: &[Song],
        n: usize,
    ) -> Result<Vec<i64>, CoverError> {
        let audio_file_ids: Vec<i64> = songs.iter().map(|song| song.audio_file_id).collect();
        let lookups = stream::iter(audio_file_ids.into_iter().map(|audio_file_id| {
            let files = self.files.clone();
            async move { (audio_file_id, files.get_cover(audio_file_id).await) }
        }))
        .buffer_unordered(COVER_LOOKUP_CONCURRENCY)
        .collect::<Vec<_>>()
        .await;

        let mut frequencies: HashMap<i64, usize> = HashMap::new();
        for (audio_file_id, outcome) in lookups {
            match outcome {
                Ok(Some(cover_id)) => *frequencies.entry(cover_id).or_insert(0) += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!("Cover lookup for audio file {} failed: {:#}", audio_file_id, e);
                    crate::server::metrics::record_cover_lookup_failure();
                }
            }
        }

        if frequencies.is_empty() {
            return Err(CoverError::EmptyAggregation);
        }

        let mut top = Vec::with_capacity(n.min(frequencies.len()));
        while top.len() < n {
            let best = frequencies
                .iter()
                .max_by(|(id_a, count_a), (id_b, count_b)| {
                    count_a.cmp(count_b).then(id_b.cmp(id_a))
                })
                .map(|(&id, _)| id);
            match best {
                Some(cover_id) => {
                    frequencies.remove(&cover_id);
                    top.push(cover_id);
                }
                None => break,
            }
        }

        Ok(top)
    }
}
