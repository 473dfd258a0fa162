//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the seeded inventory changes (file ids, titles, covers),
//! update only this file.

// ============================================================================
// Standard Inventory File IDs
// ============================================================================

/// Audio file id of "Opening Track"
pub const FILE_1_ID: i64 = 1;

/// Audio file id of "Middle Track"
pub const FILE_2_ID: i64 = 2;

/// Audio file id of "Closing Track"
pub const FILE_3_ID: i64 = 3;

/// Audio file id of "Smooth Jazz"
pub const FILE_4_ID: i64 = 4;

/// Audio file id of "Upbeat Jazz"
pub const FILE_5_ID: i64 = 5;

// ============================================================================
// Standard Inventory Metadata
// ============================================================================

/// Artist 1 name
pub const ARTIST_1_NAME: &str = "The Test Band";

/// Artist 2 name
pub const ARTIST_2_NAME: &str = "Jazz Ensemble";

/// Album 1 title
pub const ALBUM_1_TITLE: &str = "First Album";

/// Album 2 title
pub const ALBUM_2_TITLE: &str = "Jazz Collection";

/// Genre 1 name
pub const GENRE_1_NAME: &str = "Rock";

/// Genre 2 name
pub const GENRE_2_NAME: &str = "Jazz";

/// Song 1 title
pub const SONG_1_TITLE: &str = "Opening Track";

/// Song 2 title
pub const SONG_2_TITLE: &str = "Middle Track";

/// Song 3 title
pub const SONG_3_TITLE: &str = "Closing Track";

/// Song 4 title
pub const SONG_4_TITLE: &str = "Smooth Jazz";

/// Song 5 title
pub const SONG_5_TITLE: &str = "Upbeat Jazz";

// ============================================================================
// Standard Inventory Covers
// ============================================================================

/// Cover id shared by files 1 and 2
pub const COVER_1_ID: i64 = 501;

/// Cover id of file 3
pub const COVER_2_ID: i64 = 502;

/// Cover id shared by files 4 and 5
pub const COVER_3_ID: i64 = 503;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Size of the SQLite read pool test servers run with
pub const TEST_READ_POOL_SIZE: usize = 2;
