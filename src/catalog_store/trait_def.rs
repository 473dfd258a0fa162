//! CatalogStore trait definitions.
//!
//! The read side serves HTTP handlers; all writes go through a
//! `ScanTransaction` so one reconciliation commits or rolls back as a unit.

use super::models::{Album, Artist, Genre, NewSong, Song};
use anyhow::Result;

/// Storage backend for the catalog.
///
/// Read methods are safe to call concurrently from handlers. Mutation happens
/// only through [`CatalogStore::begin_scan`], which hands out the single
/// write transaction a reconciliation runs in.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Songs
    // =========================================================================

    fn get_song(&self, id: i64) -> Result<Option<Song>>;

    fn get_all_songs(&self) -> Result<Vec<Song>>;

    // =========================================================================
    // Dimensions
    // =========================================================================

    fn get_album(&self, id: i64) -> Result<Option<Album>>;

    fn get_all_albums(&self) -> Result<Vec<Album>>;

    /// Songs referencing the album. Empty when the album id is unknown.
    fn get_album_songs(&self, album_id: i64) -> Result<Vec<Song>>;

    fn get_artist(&self, id: i64) -> Result<Option<Artist>>;

    fn get_all_artists(&self) -> Result<Vec<Artist>>;

    fn get_artist_songs(&self, artist_id: i64) -> Result<Vec<Song>>;

    fn get_genre(&self, id: i64) -> Result<Option<Genre>>;

    fn get_all_genres(&self) -> Result<Vec<Genre>>;

    fn get_genre_songs(&self, genre_id: i64) -> Result<Vec<Song>>;

    // =========================================================================
    // Counts (for metrics and server stats)
    // =========================================================================

    fn get_songs_count(&self) -> usize;

    fn get_albums_count(&self) -> usize;

    fn get_artists_count(&self) -> usize;

    fn get_genres_count(&self) -> usize;

    // =========================================================================
    // Write Transaction
    // =========================================================================

    /// Begin the write transaction for one reconciliation run.
    fn begin_scan(&self) -> Result<Box<dyn ScanTransaction + '_>>;
}

/// Write primitives scoped to one reconciliation transaction.
///
/// Dropping the transaction without calling [`ScanTransaction::commit`] rolls
/// back everything applied through it. Reads issued through the transaction
/// observe its own uncommitted writes.
pub trait ScanTransaction {
    // =========================================================================
    // Songs
    // =========================================================================

    /// Insert a song and return its assigned id.
    fn insert_song(&mut self, song: &NewSong) -> Result<i64>;

    /// Overwrite every mutable field of an existing song.
    fn update_song(&mut self, song: &Song) -> Result<()>;

    /// Repoint a song at a different audio file, leaving metadata untouched.
    fn update_song_audio_file(&mut self, song_id: i64, audio_file_id: i64) -> Result<()>;

    fn delete_song(&mut self, song_id: i64) -> Result<()>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn find_album_by_title(&mut self, title: &str) -> Result<Option<i64>>;

    fn insert_album(&mut self, title: &str) -> Result<i64>;

    fn list_album_ids(&mut self) -> Result<Vec<i64>>;

    fn album_has_songs(&mut self, album_id: i64) -> Result<bool>;

    fn delete_album(&mut self, album_id: i64) -> Result<()>;

    // =========================================================================
    // Artists
    // =========================================================================

    fn find_artist_by_name(&mut self, name: &str) -> Result<Option<i64>>;

    fn insert_artist(&mut self, name: &str) -> Result<i64>;

    fn list_artist_ids(&mut self) -> Result<Vec<i64>>;

    fn artist_has_songs(&mut self, artist_id: i64) -> Result<bool>;

    fn delete_artist(&mut self, artist_id: i64) -> Result<()>;

    // =========================================================================
    // Genres
    // =========================================================================

    fn find_genre_by_name(&mut self, name: &str) -> Result<Option<i64>>;

    fn insert_genre(&mut self, name: &str) -> Result<i64>;

    fn list_genre_ids(&mut self) -> Result<Vec<i64>>;

    fn genre_has_songs(&mut self, genre_id: i64) -> Result<bool>;

    fn delete_genre(&mut self, genre_id: i64) -> Result<()>;

    /// Commit everything applied through this transaction.
    fn commit(self: Box<Self>) -> Result<()>;
}
