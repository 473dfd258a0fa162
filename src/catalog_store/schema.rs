//! SQLite schema for the catalog database.
//!
//! Integer primary keys throughout. Dimension tables carry a UNIQUE name so
//! get-or-create cannot produce two rows for the same trimmed tag value, and
//! `songs.audio_file_id` is UNIQUE because exactly one song mirrors each live
//! file in the music files service.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const ARTIST_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["title"]],
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["name"]],
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("audio_file_id", &SqlType::Integer, non_null = true),
        sqlite_column!("content_hash", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text),
        sqlite_column!("album_id", &SqlType::Integer, foreign_key = Some(&ALBUM_FK)),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            foreign_key = Some(&ARTIST_FK)
        ),
        sqlite_column!("genre_id", &SqlType::Integer, foreign_key = Some(&GENRE_FK)),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("song_number", &SqlType::Integer),
        sqlite_column!("disc_number", &SqlType::Integer),
        sqlite_column!("lyrics", &SqlType::Text),
    ],
    indices: &[
        ("idx_songs_content_hash", "content_hash"),
        ("idx_songs_album", "album_id"),
        ("idx_songs_artist", "artist_id"),
        ("idx_songs_genre", "genre_id"),
    ],
    unique_constraints: &[&["audio_file_id"]],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ALBUMS_TABLE, ARTISTS_TABLE, GENRES_TABLE, SONGS_TABLE],
    migration: None,
}];
