//! Models for the music-files service API.
//!
//! These types match the JSON structure of the files service wire format,
//! which uses camelCase keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw audio file as reported by the files service inventory.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AudioFileRef {
    pub id: i64,
    pub content_hash: String,
    pub last_update: DateTime<Utc>,
}

/// Request body of the cover ranking endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCoversRequest {
    pub audio_file_ids: Vec<i64>,
}

/// Response body of the cover ranking endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCoversResponse {
    pub cover_ids: Vec<i64>,
}

/// Response body of the per-file cover endpoint.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverResponse {
    pub cover_id: i64,
}
