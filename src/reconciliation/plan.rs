//! Classification of the files service inventory against the local catalog.
//!
//! Pure logic, no I/O. `classify` compares every inventory entry with every
//! catalog song and decides what a scan has to do about each of them.

use crate::catalog_store::Song;
use crate::files_service::AudioFileRef;
use std::collections::{HashMap, HashSet};

/// A song whose file content was replaced in place: same audio file id, new
/// content hash. Tags are re-extracted and the song row is rewritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshAction {
    pub song_id: i64,
    pub file: AudioFileRef,
}

/// A song whose file was moved or renamed at the source: same content hash,
/// new audio file id. Only the id link moves, metadata is untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelocateAction {
    pub song_id: i64,
    pub audio_file_id: i64,
}

/// Everything one scan has to apply to the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanPlan {
    /// Songs already in sync with their inventory entry.
    pub unchanged: Vec<i64>,
    /// Songs to rewrite from freshly extracted tags.
    pub refresh: Vec<RefreshAction>,
    /// Songs to point at a new audio file id.
    pub relocate: Vec<RelocateAction>,
    /// Inventory entries with no matching song at all.
    pub new_files: Vec<AudioFileRef>,
    /// Songs whose audio file disappeared from the inventory.
    pub obsolete: Vec<i64>,
}

impl ScanPlan {
    pub fn has_changes(&self) -> bool {
        !self.refresh.is_empty()
            || !self.relocate.is_empty()
            || !self.new_files.is_empty()
            || !self.obsolete.is_empty()
    }
}

/// Decide what to do about every inventory entry and every song.
///
/// Each song is claimed by at most one inventory entry. Audio file id
/// matches are resolved before content hash matches, so a renamed file can
/// never steal a song whose id is still present in the inventory. When
/// several unclaimed songs share a hash, the lowest song id is claimed
/// first; inventory order breaks ties between files. Songs left unclaimed
/// are obsolete, which keeps the catalog and the inventory in bijection.
pub fn classify(inventory: &[AudioFileRef], songs: &[Song]) -> ScanPlan {
    let songs_by_file_id: HashMap<i64, &Song> =
        songs.iter().map(|s| (s.audio_file_id, s)).collect();
    let mut songs_by_hash: HashMap<&str, Vec<&Song>> = HashMap::new();
    for song in songs {
        songs_by_hash
            .entry(song.content_hash.as_str())
            .or_default()
            .push(song);
    }
    for bucket in songs_by_hash.values_mut() {
        bucket.sort_by_key(|s| s.id);
    }

    let mut plan = ScanPlan::default();
    let mut claimed: HashSet<i64> = HashSet::new();

    let mut hash_candidates: Vec<&AudioFileRef> = Vec::new();
    for file in inventory {
        match songs_by_file_id.get(&file.id) {
            Some(song) if song.content_hash == file.content_hash => {
                claimed.insert(song.id);
                plan.unchanged.push(song.id);
            }
            Some(song) => {
                claimed.insert(song.id);
                plan.refresh.push(RefreshAction {
                    song_id: song.id,
                    file: file.clone(),
                });
            }
            None => hash_candidates.push(file),
        }
    }

    for file in hash_candidates {
        let relocated = songs_by_hash
            .get(file.content_hash.as_str())
            .and_then(|bucket| bucket.iter().find(|s| !claimed.contains(&s.id)))
            .copied();
        match relocated {
            Some(song) => {
                claimed.insert(song.id);
                plan.relocate.push(RelocateAction {
                    song_id: song.id,
                    audio_file_id: file.id,
                });
            }
            None => plan.new_files.push(file.clone()),
        }
    }

    for song in songs {
        if !claimed.contains(&song.id) {
            plan.obsolete.push(song.id);
        }
    }

    plan
}
