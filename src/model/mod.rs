//! Core data models for the songplay star schema.
//!
//! Two families of types live here:
//! - Raw input records, one per JSON line: [`SongRecord`] (catalog) and
//!   [`LogRecord`] (activity log)
//! - Typed rows for the five target tables: [`SongRow`], [`ArtistRow`],
//!   [`UserRow`], [`TimeRow`] and [`SongPlayRow`]
//!
//! # Database Schema
//!
//! The rows map to the following tables:
//! - `songs` - Song catalog, keyed by song id
//! - `artists` - Performing artists, keyed by artist id
//! - `users` - Service users, keyed by integer user id
//! - `time` - Calendar breakdown keyed by raw millisecond timestamp
//! - `songplays` - One fact row per "song played" event

use serde::{Deserialize, Deserializer};
use sqlx::FromRow;

/// Page value that marks a "song played" activity event.
pub const SONG_PLAY_PAGE: &str = "NextSong";

// ============================================================================
// Raw Input Records
// ============================================================================

/// One line of a song catalog file.
///
/// Every field is optional: missing values reach the store as NULL and the
/// table constraints decide whether that is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SongRecord {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub year: Option<i32>,
    pub duration: Option<f64>,
}

/// One line of an activity log file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Event time in milliseconds since the Unix epoch
    pub ts: i64,
    #[serde(default)]
    pub page: Option<String>,
    /// Song title as played
    #[serde(default)]
    pub song: Option<String>,
    /// Artist name as played
    #[serde(default)]
    pub artist: Option<String>,
    /// Play length in seconds
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "lenient_user_id")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogRecord {
    /// Whether this event is a "song played" action.
    pub fn is_song_play(&self) -> bool {
        self.page.as_deref() == Some(SONG_PLAY_PAGE)
    }
}

/// Log files carry `userId` as a number, a numeric string, or `""` for
/// logged-out sessions.
fn lenient_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Int(id)) => Ok(Some(id)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid userId: {s:?}"))),
    }
}

// ============================================================================
// Table Rows
// ============================================================================

/// A row of the `songs` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SongRow {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    /// Release year, 0 when unknown
    pub year: Option<i32>,
    /// Duration in seconds
    pub duration: Option<f64>,
}

/// A row of the `artists` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ArtistRow {
    pub artist_id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserRow {
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    /// Subscription level: "free" or "paid"
    pub level: Option<String>,
}

/// A row of the `time` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TimeRow {
    /// Raw event timestamp in milliseconds, used verbatim as the key
    pub start_time: i64,
    pub hour: i64,
    pub day: i64,
    /// ISO-8601 week number
    pub week: i64,
    pub month: i64,
    pub year: i64,
    /// English weekday name, e.g. "Monday"
    pub weekday: String,
}

/// A songplay waiting for key resolution.
///
/// Carries the (title, artist name, duration) triple used to look up the
/// song and artist ids, alongside the fact columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlayCandidate {
    pub start_time: i64,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub song_title: Option<String>,
    pub artist_name: Option<String>,
    pub length: Option<f64>,
}

impl SongPlayCandidate {
    /// Attach the resolved keys, producing the row to insert.
    pub fn resolve(self, key: Option<SongKey>) -> SongPlayRow {
        let (song_id, artist_id) = match key {
            Some(k) => (Some(k.song_id), Some(k.artist_id)),
            None => (None, None),
        };
        SongPlayRow {
            start_time: self.start_time,
            user_id: self.user_id,
            level: self.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location,
            user_agent: self.user_agent,
        }
    }
}

/// Song and artist ids found by the key resolver.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SongKey {
    pub song_id: String,
    pub artist_id: String,
}

/// A row of the `songplays` table, without the id the store assigns.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SongPlayRow {
    pub start_time: i64,
    pub user_id: Option<i64>,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}
