//! Catalog entity models.
//!
//! Songs mirror entries of the external music files service; albums, artists
//! and genres are dimension rows created lazily from song tags.

use serde::{Deserialize, Serialize};

/// A song in the catalog.
///
/// `audio_file_id` and `content_hash` together identify the owning file in
/// the music files service and drive reconciliation; `id` is the catalog's
/// own stable identity and survives file renames.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub audio_file_id: i64,
    pub content_hash: String,
    pub title: Option<String>,
    pub album_id: Option<i64>,
    pub artist_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub year: Option<i32>,
    pub song_number: Option<i32>,
    pub disc_number: Option<i32>,
    pub lyrics: Option<String>,
}

/// A song about to be inserted, before the catalog has assigned it an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSong {
    pub audio_file_id: i64,
    pub content_hash: String,
    pub title: Option<String>,
    pub album_id: Option<i64>,
    pub artist_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub year: Option<i32>,
    pub song_number: Option<i32>,
    pub disc_number: Option<i32>,
    pub lyrics: Option<String>,
}

impl NewSong {
    pub fn into_song(self, id: i64) -> Song {
        Song {
            id,
            audio_file_id: self.audio_file_id,
            content_hash: self.content_hash,
            title: self.title,
            album_id: self.album_id,
            artist_id: self.artist_id,
            genre_id: self.genre_id,
            year: self.year,
            song_number: self.song_number,
            disc_number: self.disc_number,
            lyrics: self.lyrics,
        }
    }
}

/// Album dimension row, deduplicated by exact title.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: String,
}

/// Artist dimension row, deduplicated by exact name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
}

/// Genre dimension row, deduplicated by exact name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}
