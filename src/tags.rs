//! Tag extraction from raw audio bytes using lofty.

use lofty::file::TaggedFileExt;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::ItemKey;
use std::io::Cursor;
use thiserror::Error;

/// Tag extraction errors.
#[derive(Debug, Error)]
pub enum TagError {
    /// I/O error while probing the audio stream
    #[error("Failed to read audio stream: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized or corrupt audio data
    #[error("Failed to parse audio tags: {0}")]
    Parse(#[from] lofty::error::LoftyError),
}

/// Metadata extracted from an audio file's tags.
///
/// Every field is optional; files with no tags at all produce the default
/// all-`None` value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongTags {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub song_number: Option<i32>,
    pub disc_number: Option<i32>,
    pub lyrics: Option<String>,
}

/// Reads tags out of in-memory audio bytes.
///
/// The production implementation is `LoftyTagReader`; tests substitute
/// hand-written fakes.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, bytes: &[u8]) -> Result<SongTags, TagError>;
}

/// `TagReader` backed by the lofty crate.
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, bytes: &[u8]) -> Result<SongTags, TagError> {
        let tagged_file = Probe::new(Cursor::new(bytes)).guess_file_type()?.read()?;

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());
        let Some(tag) = tag else {
            return Ok(SongTags::default());
        };

        Ok(SongTags {
            title: tag.title().map(|s| s.to_string()),
            album: tag.album().map(|s| s.to_string()),
            artist: tag.artist().map(|s| s.to_string()),
            genre: tag.genre().map(|s| s.to_string()),
            year: tag.year().map(|y| y as i32),
            song_number: tag.track().map(|n| n as i32),
            disc_number: tag.disk().map(|n| n as i32),
            lyrics: tag.get_string(&ItemKey::Lyrics).map(|s| s.to_string()),
        })
    }
}
