//! Catalog reconciliation against the music-files service.
//!
//! One `sync` run lists the full inventory, classifies it against the full
//! catalog, downloads and extracts tags where needed, then applies every
//! mutation inside a single write transaction.

mod plan;

pub use plan::{classify, RefreshAction, RelocateAction, ScanPlan};

use crate::catalog_store::{CatalogStore, NewSong, ScanTransaction, Song};
use crate::files_service::{AudioFileRef, AudioFilesService};
use crate::tags::{SongTags, TagReader};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by one reconciliation run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The files service inventory could not be listed
    #[error("Files service unavailable: {0}")]
    Upstream(anyhow::Error),

    /// A catalog store operation failed; the scan transaction rolled back
    #[error("Catalog store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Counts of what one reconciliation run did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Songs inserted for inventory files never seen before.
    pub added: usize,
    /// Songs rewritten because their file content changed.
    pub updated: usize,
    /// Songs pointed at a new audio file id after a rename.
    pub relinked: usize,
    /// Songs deleted because their file left the inventory.
    pub removed: usize,
    /// Files skipped after a download or tag extraction failure.
    pub skipped: usize,
    pub removed_albums: usize,
    pub removed_artists: usize,
    pub removed_genres: usize,
}

/// Drives the catalog to match the files service inventory.
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    files: Arc<dyn AudioFilesService>,
    tags: Arc<dyn TagReader>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        files: Arc<dyn AudioFilesService>,
        tags: Arc<dyn TagReader>,
    ) -> Self {
        Self { store, files, tags }
    }

    /// Run one full reconciliation.
    ///
    /// An inventory listing failure or any store failure aborts the run; a
    /// download or tag extraction failure only skips that one file.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let inventory = self
            .files
            .list_audio_files()
            .await
            .map_err(SyncError::Upstream)?;
        let songs = self.store.get_all_songs()?;

        let plan = classify(&inventory, &songs);
        info!(
            "Classified {} files against {} songs: {} new, {} changed, {} renamed, {} obsolete",
            inventory.len(),
            songs.len(),
            plan.new_files.len(),
            plan.refresh.len(),
            plan.relocate.len(),
            plan.obsolete.len()
        );

        // Fetch phase. Every download and tag extraction happens before the
        // write transaction opens; a failing file is skipped, not fatal.
        let mut skipped = 0usize;
        let mut refreshes: Vec<(i64, &AudioFileRef, SongTags)> = Vec::new();
        for action in &plan.refresh {
            match self.fetch_tags(action.file.id).await {
                Ok(tags) => refreshes.push((action.song_id, &action.file, tags)),
                Err(e) => {
                    warn!("Skipping changed audio file {}: {:#}", action.file.id, e);
                    skipped += 1;
                }
            }
        }
        let mut inserts: Vec<(&AudioFileRef, SongTags)> = Vec::new();
        for file in &plan.new_files {
            match self.fetch_tags(file.id).await {
                Ok(tags) => inserts.push((file, tags)),
                Err(e) => {
                    warn!("Skipping new audio file {}: {:#}", file.id, e);
                    skipped += 1;
                }
            }
        }

        // Apply phase. No await while the transaction is open.
        let mut report = SyncReport {
            skipped,
            ..SyncReport::default()
        };
        let mut tx = self.store.begin_scan()?;

        for song_id in &plan.obsolete {
            tx.delete_song(*song_id)?;
            report.removed += 1;
        }

        for (song_id, file, tags) in &refreshes {
            let (album_id, artist_id, genre_id) = resolve_dimensions(tx.as_mut(), tags)?;
            tx.update_song(&Song {
                id: *song_id,
                audio_file_id: file.id,
                content_hash: file.content_hash.clone(),
                title: tags.title.clone(),
                album_id,
                artist_id,
                genre_id,
                year: tags.year,
                song_number: tags.song_number,
                disc_number: tags.disc_number,
                lyrics: tags.lyrics.clone(),
            })?;
            report.updated += 1;
        }

        for action in &plan.relocate {
            tx.update_song_audio_file(action.song_id, action.audio_file_id)?;
            report.relinked += 1;
        }

        for (file, tags) in &inserts {
            let (album_id, artist_id, genre_id) = resolve_dimensions(tx.as_mut(), tags)?;
            tx.insert_song(&NewSong {
                audio_file_id: file.id,
                content_hash: file.content_hash.clone(),
                title: tags.title.clone(),
                album_id,
                artist_id,
                genre_id,
                year: tags.year,
                song_number: tags.song_number,
                disc_number: tags.disc_number,
                lyrics: tags.lyrics.clone(),
            })?;
            report.added += 1;
        }

        // Cleanup pass: dimension rows no song references anymore.
        for album_id in tx.list_album_ids()? {
            if !tx.album_has_songs(album_id)? {
                tx.delete_album(album_id)?;
                report.removed_albums += 1;
            }
        }
        for artist_id in tx.list_artist_ids()? {
            if !tx.artist_has_songs(artist_id)? {
                tx.delete_artist(artist_id)?;
                report.removed_artists += 1;
            }
        }
        for genre_id in tx.list_genre_ids()? {
            if !tx.genre_has_songs(genre_id)? {
                tx.delete_genre(genre_id)?;
                report.removed_genres += 1;
            }
        }

        tx.commit()?;

        info!(
            "Scan applied: {} added, {} updated, {} relinked, {} removed, {} skipped",
            report.added, report.updated, report.relinked, report.removed, report.skipped
        );
        Ok(report)
    }

    async fn fetch_tags(&self, audio_file_id: i64) -> anyhow::Result<SongTags> {
        let bytes = self.files.download_audio_file(audio_file_id).await?;
        let tags = self.tags.read_tags(&bytes)?;
        Ok(tags)
    }
}

fn resolve_dimensions(
    tx: &mut dyn ScanTransaction,
    tags: &SongTags,
) -> anyhow::Result<(Option<i64>, Option<i64>, Option<i64>)> {
    let album_id = resolve_album(tx, tags.album.as_deref())?;
    let artist_id = resolve_artist(tx, tags.artist.as_deref())?;
    let genre_id = resolve_genre(tx, tags.genre.as_deref())?;
    Ok((album_id, artist_id, genre_id))
}

fn resolve_album(tx: &mut dyn ScanTransaction, raw: Option<&str>) -> anyhow::Result<Option<i64>> {
    let Some(title) = normalize_name(raw) else {
        return Ok(None);
    };
    if let Some(id) = tx.find_album_by_title(&title)? {
        return Ok(Some(id));
    }
    Ok(Some(tx.insert_album(&title)?))
}

fn resolve_artist(tx: &mut dyn ScanTransaction, raw: Option<&str>) -> anyhow::Result<Option<i64>> {
    let Some(name) = normalize_name(raw) else {
        return Ok(None);
    };
    if let Some(id) = tx.find_artist_by_name(&name)? {
        return Ok(Some(id));
    }
    Ok(Some(tx.insert_artist(&name)?))
}

fn resolve_genre(tx: &mut dyn ScanTransaction, raw: Option<&str>) -> anyhow::Result<Option<i64>> {
    let Some(name) = normalize_name(raw) else {
        return Ok(None);
    };
    if let Some(id) = tx.find_genre_by_name(&name)? {
        return Ok(Some(id));
    }
    Ok(Some(tx.insert_genre(&name)?))
}

/// Trimmed dimension name, `None` when empty or missing.
fn normalize_name(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
