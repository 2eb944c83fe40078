//! Test utilities and fixtures for songplay-etl tests.
//!
//! This module provides common test helpers, record factories, and
//! database utilities to reduce boilerplate in tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{temp_db, mock_log_record};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (mut conn, _dir) = temp_db().await;
//!     let record = mock_log_record();
//!     // ... test logic
//! }
//! ```

use std::path::Path;

use serde_json::json;
use sqlx::SqliteConnection;
use tempfile::TempDir;

use crate::model::{ArtistRow, LogRecord, SongPlayRow, SongRecord, SongRow, TimeRow, UserRow};

/// Creates a temporary database with all tables for testing.
///
/// # Returns
///
/// A tuple of (connection, temp directory handle).
/// Keep the TempDir alive for the duration of your test.
pub async fn temp_db() -> (SqliteConnection, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let conn = crate::db::init_db(&db_url)
        .await
        .expect("Failed to initialize test database");

    (conn, dir)
}

/// The catalog record of the reference scenario: song SOSC1 "X" by AR1 "Y".
///
/// Customize using struct update syntax:
///
/// ```ignore
/// let record = SongRecord { year: Some(1999), ..mock_song_record() };
/// ```
pub fn mock_song_record() -> SongRecord {
    SongRecord {
        song_id: Some("SOSC1".to_string()),
        title: Some("X".to_string()),
        artist_id: Some("AR1".to_string()),
        artist_name: Some("Y".to_string()),
        artist_location: None,
        artist_latitude: None,
        artist_longitude: None,
        year: Some(2000),
        duration: Some(210.5),
    }
}

/// The activity record of the reference scenario: user 7 plays "X" by "Y".
pub fn mock_log_record() -> LogRecord {
    LogRecord {
        ts: 1000,
        page: Some("NextSong".to_string()),
        song: Some("X".to_string()),
        artist: Some("Y".to_string()),
        length: Some(210.5),
        user_id: Some(7),
        first_name: Some("A".to_string()),
        last_name: Some("B".to_string()),
        gender: Some("F".to_string()),
        level: Some("free".to_string()),
        session_id: Some(1),
        location: Some("L".to_string()),
        user_agent: Some("UA".to_string()),
    }
}

/// Render a catalog record as one JSON line, in the catalog file layout.
pub fn catalog_line(record: &SongRecord) -> String {
    json!({
        "num_songs": 1,
        "song_id": record.song_id,
        "title": record.title,
        "artist_id": record.artist_id,
        "artist_name": record.artist_name,
        "artist_location": record.artist_location,
        "artist_latitude": record.artist_latitude,
        "artist_longitude": record.artist_longitude,
        "year": record.year,
        "duration": record.duration,
    })
    .to_string()
}

/// Render an activity record as one JSON line, in the log file layout.
///
/// `userId` is written as a string, the way service logs carry it.
pub fn activity_line(record: &LogRecord) -> String {
    json!({
        "ts": record.ts,
        "page": record.page,
        "song": record.song,
        "artist": record.artist,
        "length": record.length,
        "userId": record.user_id.map(|id| id.to_string()).unwrap_or_default(),
        "firstName": record.first_name,
        "lastName": record.last_name,
        "gender": record.gender,
        "level": record.level,
        "sessionId": record.session_id,
        "location": record.location,
        "userAgent": record.user_agent,
        "auth": "Logged In",
        "method": "PUT",
        "status": 200,
    })
    .to_string()
}

/// Write lines to a file, creating parent directories as needed.
pub fn write_lines(path: &Path, lines: &[String]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, lines.join("\n")).expect("Failed to write test file");
}

/// A user row with the reference names and the given id and level.
pub fn mock_user(user_id: i64, level: &str) -> UserRow {
    UserRow {
        user_id: Some(user_id),
        first_name: Some("A".to_string()),
        last_name: Some("B".to_string()),
        gender: Some("F".to_string()),
        level: Some(level.to_string()),
    }
}

/// The time row derived from `ts` in the reference scenario (1970-01-01).
pub fn mock_time_row(start_time: i64) -> TimeRow {
    TimeRow {
        start_time,
        hour: 0,
        day: 1,
        week: 1,
        month: 1,
        year: 1970,
        weekday: "Thursday".to_string(),
    }
}

/// An unlinked songplay for the given user.
pub fn mock_songplay(user_id: i64) -> SongPlayRow {
    SongPlayRow {
        start_time: 1000,
        user_id: Some(user_id),
        level: Some("free".to_string()),
        song_id: None,
        artist_id: None,
        session_id: Some(1),
        location: Some("L".to_string()),
        user_agent: Some("UA".to_string()),
    }
}

/// Inserts a song and its artist so the key resolver can find them.
pub async fn seed_song(
    conn: &mut SqliteConnection,
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    duration: f64,
) {
    crate::db::insert_song(
        conn,
        &SongRow {
            song_id: Some(song_id.to_string()),
            title: Some(title.to_string()),
            artist_id: Some(artist_id.to_string()),
            year: Some(0),
            duration: Some(duration),
        },
    )
    .await
    .expect("Failed to insert song");

    crate::db::upsert_artist(
        conn,
        &ArtistRow {
            artist_id: Some(artist_id.to_string()),
            name: Some(artist_name.to_string()),
            location: None,
            latitude: None,
            longitude: None,
        },
    )
    .await
    .expect("Failed to insert artist");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_temp_db_creates_working_database() {
        let (mut conn, _dir) = temp_db().await;
        let counts = crate::db::table_counts(&mut conn).await.unwrap();
        assert_eq!(counts.songplays, 0);
    }

    #[test]
    fn test_lines_parse_back() {
        let song: SongRecord = serde_json::from_str(&catalog_line(&mock_song_record())).unwrap();
        assert_eq!(song, mock_song_record());

        let log: LogRecord = serde_json::from_str(&activity_line(&mock_log_record())).unwrap();
        assert_eq!(log, mock_log_record());
    }

    #[test]
    fn test_mock_time_row_matches_transform() {
        assert_eq!(crate::transform::time_row(1000).unwrap(), mock_time_row(1000));
    }
}
