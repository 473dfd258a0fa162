//! SQLite-backed catalog store.
//!
//! One write connection guarded by a mutex plus a small pool of read
//! connections in WAL mode. Reconciliation writes run through
//! `SqliteScanTransaction`, a `BEGIN IMMEDIATE` transaction that rolls back
//! unless committed.

use super::models::{Album, Artist, Genre, NewSong, Song};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::{CatalogStore, ScanTransaction};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

const SONG_COLUMNS: &str =
    "id, audio_file_id, content_hash, title, album_id, artist_id, genre_id, year, song_number, disc_number, lyrics";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_version = CATALOG_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &CATALOG_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version < BASE_DB_VERSION as i64 {
        bail!(
            "Database was not created by this server (user_version {})",
            db_version
        );
    }

    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version > latest_version {
        bail!(
            "Database schema version {} is newer than this binary supports ({})",
            current_version,
            latest_version
        );
    }

    if current_version < latest_version {
        let tx = conn.transaction()?;
        for schema in CATALOG_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating catalog db from version {} to {}",
                    current_version, schema.version
                );
                migration_fn(&tx)?;
                current_version = schema.version;
            }
        }
        tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
        tx.commit()?;
    }

    latest_schema.validate(conn)?;
    Ok(())
}

fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        audio_file_id: row.get(1)?,
        content_hash: row.get(2)?,
        title: row.get(3)?,
        album_id: row.get(4)?,
        artist_id: row.get(5)?,
        genre_id: row.get(6)?,
        year: row.get(7)?,
        song_number: row.get(8)?,
        disc_number: row.get(9)?,
        lyrics: row.get(10)?,
    })
}

impl SqliteCatalogStore {
    /// Open (or create) the catalog database at `db_path`.
    ///
    /// A pre-existing database is validated against the expected schema and
    /// rejected on any mismatch.
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open catalog database")?;

        migrate_if_needed(&mut write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let song_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM songs", [], |r| r.get(0))
            .unwrap_or(0);
        let album_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM albums", [], |r| r.get(0))
            .unwrap_or(0);
        let artist_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM artists", [], |r| r.get(0))
            .unwrap_or(0);

        info!(
            "Opened catalog: {} songs, {} albums, {} artists",
            song_count, album_count, artist_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCatalogStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn count_rows(&self, table: &str) -> usize {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get::<_, i64>(0)
        })
        .unwrap_or(0) as usize
    }

    fn query_songs(&self, sql: &str, id: Option<i64>) -> Result<Vec<Song>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(sql)?;
        let songs = match id {
            Some(id) => stmt
                .query_map(params![id], parse_song_row)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], parse_song_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(songs)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_song(&self, id: i64) -> Result<Option<Song>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {} FROM songs WHERE id = ?1", SONG_COLUMNS),
            params![id],
            parse_song_row,
        ) {
            Ok(song) => Ok(Some(song)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_songs(&self) -> Result<Vec<Song>> {
        self.query_songs(
            &format!("SELECT {} FROM songs ORDER BY id", SONG_COLUMNS),
            None,
        )
    }

    fn get_album(&self, id: i64) -> Result<Option<Album>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, title FROM albums WHERE id = ?1",
            params![id],
            |r| {
                Ok(Album {
                    id: r.get(0)?,
                    title: r.get(1)?,
                })
            },
        ) {
            Ok(album) => Ok(Some(album)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_albums(&self) -> Result<Vec<Album>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, title FROM albums ORDER BY title")?;
        let albums = stmt
            .query_map([], |r| {
                Ok(Album {
                    id: r.get(0)?,
                    title: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }

    fn get_album_songs(&self, album_id: i64) -> Result<Vec<Song>> {
        self.query_songs(
            &format!(
                "SELECT {} FROM songs WHERE album_id = ?1 ORDER BY disc_number, song_number, id",
                SONG_COLUMNS
            ),
            Some(album_id),
        )
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, name FROM artists WHERE id = ?1",
            params![id],
            |r| {
                Ok(Artist {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            },
        ) {
            Ok(artist) => Ok(Some(artist)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM artists ORDER BY name")?;
        let artists = stmt
            .query_map([], |r| {
                Ok(Artist {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn get_artist_songs(&self, artist_id: i64) -> Result<Vec<Song>> {
        self.query_songs(
            &format!(
                "SELECT {} FROM songs WHERE artist_id = ?1 ORDER BY id",
                SONG_COLUMNS
            ),
            Some(artist_id),
        )
    }

    fn get_genre(&self, id: i64) -> Result<Option<Genre>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, name FROM genres WHERE id = ?1",
            params![id],
            |r| {
                Ok(Genre {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            },
        ) {
            Ok(genre) => Ok(Some(genre)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_all_genres(&self) -> Result<Vec<Genre>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT id, name FROM genres ORDER BY name")?;
        let genres = stmt
            .query_map([], |r| {
                Ok(Genre {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn get_genre_songs(&self, genre_id: i64) -> Result<Vec<Song>> {
        self.query_songs(
            &format!(
                "SELECT {} FROM songs WHERE genre_id = ?1 ORDER BY id",
                SONG_COLUMNS
            ),
            Some(genre_id),
        )
    }

    fn get_songs_count(&self) -> usize {
        self.count_rows("songs")
    }

    fn get_albums_count(&self) -> usize {
        self.count_rows("albums")
    }

    fn get_artists_count(&self) -> usize {
        self.count_rows("artists")
    }

    fn get_genres_count(&self) -> usize {
        self.count_rows("genres")
    }

    fn begin_scan(&self) -> Result<Box<dyn ScanTransaction + '_>> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(Box::new(SqliteScanTransaction {
            conn,
            committed: false,
        }))
    }
}

struct SqliteScanTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    committed: bool,
}

impl Drop for SqliteScanTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let _ = self.conn.execute("ROLLBACK", []);
        }
    }
}

impl ScanTransaction for SqliteScanTransaction<'_> {
    fn insert_song(&mut self, song: &NewSong) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO songs (audio_file_id, content_hash, title, album_id, artist_id, genre_id, year, song_number, disc_number, lyrics)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                song.audio_file_id,
                &song.content_hash,
                &song.title,
                song.album_id,
                song.artist_id,
                song.genre_id,
                song.year,
                song.song_number,
                song.disc_number,
                &song.lyrics,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_song(&mut self, song: &Song) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE songs SET audio_file_id = ?2, content_hash = ?3, title = ?4, album_id = ?5,
             artist_id = ?6, genre_id = ?7, year = ?8, song_number = ?9, disc_number = ?10, lyrics = ?11
             WHERE id = ?1",
            params![
                song.id,
                song.audio_file_id,
                &song.content_hash,
                &song.title,
                song.album_id,
                song.artist_id,
                song.genre_id,
                song.year,
                song.song_number,
                song.disc_number,
                &song.lyrics,
            ],
        )?;
        if updated == 0 {
            bail!("Song {} not found", song.id);
        }
        Ok(())
    }

    fn update_song_audio_file(&mut self, song_id: i64, audio_file_id: i64) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE songs SET audio_file_id = ?2 WHERE id = ?1",
            params![song_id, audio_file_id],
        )?;
        if updated == 0 {
            bail!("Song {} not found", song_id);
        }
        Ok(())
    }

    fn delete_song(&mut self, song_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM songs WHERE id = ?1", params![song_id])?;
        Ok(())
    }

    fn find_album_by_title(&mut self, title: &str) -> Result<Option<i64>> {
        match self.conn.query_row(
            "SELECT id FROM albums WHERE title = ?1",
            params![title],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_album(&mut self, title: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO albums (title) VALUES (?1)", params![title])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_album_ids(&mut self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare_cached("SELECT id FROM albums")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn album_has_songs(&mut self, album_id: i64) -> Result<bool> {
        let has_songs: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE album_id = ?1)",
            params![album_id],
            |r| r.get(0),
        )?;
        Ok(has_songs)
    }

    fn delete_album(&mut self, album_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM albums WHERE id = ?1", params![album_id])?;
        Ok(())
    }

    fn find_artist_by_name(&mut self, name: &str) -> Result<Option<i64>> {
        match self.conn.query_row(
            "SELECT id FROM artists WHERE name = ?1",
            params![name],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_artist(&mut self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO artists (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_artist_ids(&mut self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare_cached("SELECT id FROM artists")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn artist_has_songs(&mut self, artist_id: i64) -> Result<bool> {
        let has_songs: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE artist_id = ?1)",
            params![artist_id],
            |r| r.get(0),
        )?;
        Ok(has_songs)
    }

    fn delete_artist(&mut self, artist_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM artists WHERE id = ?1", params![artist_id])?;
        Ok(())
    }

    fn find_genre_by_name(&mut self, name: &str) -> Result<Option<i64>> {
        match self.conn.query_row(
            "SELECT id FROM genres WHERE name = ?1",
            params![name],
            |r| r.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_genre(&mut self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO genres (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_genre_ids(&mut self) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare_cached("SELECT id FROM genres")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn genre_has_songs(&mut self, genre_id: i64) -> Result<bool> {
        let has_songs: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE genre_id = ?1)",
            params![genre_id],
            |r| r.get(0),
        )?;
        Ok(has_songs)
    }

    fn delete_genre(&mut self, genre_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM genres WHERE id = ?1", params![genre_id])?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        self.committed = true;
        Ok(())
    }
}
