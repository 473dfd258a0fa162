//! Audio fixture synthesis for end-to-end tests
//!
//! Generated files are minimal FLAC streams: a stream info block plus a
//! Vorbis comment block. That is enough for tag extraction to see real
//! metadata without shipping binary fixtures in the repo.

use super::constants::*;
use super::stub_files::StubFilesService;

/// Vorbis comment fields to embed in a generated audio file.
#[derive(Clone, Debug, Default)]
pub struct TagSpec {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub song_number: Option<i32>,
    pub disc_number: Option<i32>,
    pub lyrics: Option<String>,
}

impl TagSpec {
    /// The four usual text fields set, everything else empty.
    pub fn named(title: &str, album: &str, artist: &str, genre: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            album: Some(album.to_string()),
            artist: Some(artist.to_string()),
            genre: Some(genre.to_string()),
            ..Self::default()
        }
    }
}

/// Stream info declaring 44.1kHz stereo 16 bit, one second of audio,
/// unknown frame sizes and a zeroed MD5.
const STREAM_INFO: [u8; 34] = [
    0x10, 0x00, // min block size 4096
    0x10, 0x00, // max block size 4096
    0x00, 0x00, 0x00, // min frame size unknown
    0x00, 0x00, 0x00, // max frame size unknown
    0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x00, 0xAC, 0x44, // rate, channels, depth, samples
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // md5
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Builds a parseable FLAC file carrying the given tags.
///
/// The stream ends after the metadata blocks; tag probing never looks at
/// audio frames.
pub fn flac_bytes(tags: &TagSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);
    out.extend_from_slice(b"fLaC");

    // Stream info block, 34 bytes, more blocks follow.
    out.push(0x00);
    out.extend_from_slice(&u24_be(STREAM_INFO.len()));
    out.extend_from_slice(&STREAM_INFO);

    // Vorbis comment block, flagged as the last metadata block.
    let comment = vorbis_comment_block(tags);
    out.push(0x84);
    out.extend_from_slice(&u24_be(comment.len()));
    out.extend_from_slice(&comment);

    out
}

/// Bytes no audio parser accepts. Scans must skip files like this.
pub fn corrupt_bytes() -> Vec<u8> {
    b"this is not an audio stream at all".to_vec()
}

fn vorbis_comment_block(tags: &TagSpec) -> Vec<u8> {
    let mut fields: Vec<String> = Vec::new();
    if let Some(v) = &tags.title {
        fields.push(format!("TITLE={}", v));
    }
    if let Some(v) = &tags.album {
        fields.push(format!("ALBUM={}", v));
    }
    if let Some(v) = &tags.artist {
        fields.push(format!("ARTIST={}", v));
    }
    if let Some(v) = &tags.genre {
        fields.push(format!("GENRE={}", v));
    }
    if let Some(v) = tags.year {
        fields.push(format!("DATE={}", v));
    }
    if let Some(v) = tags.song_number {
        fields.push(format!("TRACKNUMBER={}", v));
    }
    if let Some(v) = tags.disc_number {
        fields.push(format!("DISCNUMBER={}", v));
    }
    if let Some(v) = &tags.lyrics {
        fields.push(format!("LYRICS={}", v));
    }

    let vendor = b"fonoteca test fixtures";
    let mut block = Vec::with_capacity(128);
    block.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    block.extend_from_slice(vendor);
    block.extend_from_slice(&(fields.len() as u32).to_le_bytes());
    for field in &fields {
        block.extend_from_slice(&(field.len() as u32).to_le_bytes());
        block.extend_from_slice(field.as_bytes());
    }
    block
}

fn u24_be(len: usize) -> [u8; 3] {
    [(len >> 16) as u8, (len >> 8) as u8, len as u8]
}

/// Fills the stub with the standard five-song inventory:
///
/// - Files 1-3: "First Album" by "The Test Band", Rock, 2020, tracks 1-3
/// - Files 4-5: "Jazz Collection" by "Jazz Ensemble", Jazz, 2021, tracks 1-2
/// - Covers: files 1-2 share cover 501, file 3 has 502, files 4-5 share 503
///
/// Content hashes follow the `hash-{file id}` pattern.
pub fn seed_standard_inventory(files: &StubFilesService) {
    let rock = |title: &str, track: i32| TagSpec {
        title: Some(title.to_string()),
        album: Some(ALBUM_1_TITLE.to_string()),
        artist: Some(ARTIST_1_NAME.to_string()),
        genre: Some(GENRE_1_NAME.to_string()),
        year: Some(2020),
        song_number: Some(track),
        disc_number: Some(1),
        lyrics: None,
    };
    let jazz = |title: &str, track: i32| TagSpec {
        title: Some(title.to_string()),
        album: Some(ALBUM_2_TITLE.to_string()),
        artist: Some(ARTIST_2_NAME.to_string()),
        genre: Some(GENRE_2_NAME.to_string()),
        year: Some(2021),
        song_number: Some(track),
        disc_number: Some(1),
        lyrics: None,
    };

    let mut opening = rock(SONG_1_TITLE, 1);
    opening.lyrics = Some("Let the needle drop".to_string());

    files.put_file(FILE_1_ID, "hash-1", flac_bytes(&opening));
    files.put_file(FILE_2_ID, "hash-2", flac_bytes(&rock(SONG_2_TITLE, 2)));
    files.put_file(FILE_3_ID, "hash-3", flac_bytes(&rock(SONG_3_TITLE, 3)));
    files.put_file(FILE_4_ID, "hash-4", flac_bytes(&jazz(SONG_4_TITLE, 1)));
    files.put_file(FILE_5_ID, "hash-5", flac_bytes(&jazz(SONG_5_TITLE, 2)));

    files.set_cover(FILE_1_ID, COVER_1_ID);
    files.set_cover(FILE_2_ID, COVER_1_ID);
    files.set_cover(FILE_3_ID, COVER_2_ID);
    files.set_cover(FILE_4_ID, COVER_3_ID);
    files.set_cover(FILE_5_ID, COVER_3_ID);
}
