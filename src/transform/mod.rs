//! Record transformation: raw JSON lines to typed table rows.
//!
//! Catalog lines split into one [`SongRow`] and one [`ArtistRow`] each.
//! Activity lines are filtered down to "song played" events, and each kept
//! event yields a [`TimeRow`], a [`UserRow`] and a [`SongPlayCandidate`].
//!
//! Nothing here validates values beyond the page filter. Missing fields stay
//! `None` and the store constraints decide what is acceptable.

use std::path::Path;

use chrono::{DateTime, Datelike, Timelike};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{
    ArtistRow, LogRecord, SONG_PLAY_PAGE, SongPlayCandidate, SongRecord, SongRow, TimeRow,
    UserRow,
};

/// Rows derived from one catalog line.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRows {
    pub song: SongRow,
    pub artist: ArtistRow,
}

/// Rows derived from one activity log file.
///
/// The three vectors are parallel: index `i` of each belongs to the same
/// kept event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRows {
    pub time: Vec<TimeRow>,
    pub users: Vec<UserRow>,
    pub plays: Vec<SongPlayCandidate>,
    /// Events dropped by the page filter
    pub skipped: usize,
}

/// Parse newline-delimited JSON into typed records.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse_lines<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<Vec<T>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| Error::malformed(path, idx + 1, e))
        })
        .collect()
}

/// Parse an activity log file, keeping only "song played" events.
///
/// Each line is read as loose JSON first and checked against the page
/// filter. Only kept lines must match the [`LogRecord`] shape, so a dropped
/// event with a missing `ts` or odd field types never fails the file.
/// Returns the kept records and the number of dropped events.
pub fn parse_song_plays(path: &Path, contents: &str) -> Result<(Vec<LogRecord>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).map_err(|e| Error::malformed(path, idx + 1, e))?;
        if value.get("page").and_then(Value::as_str) != Some(SONG_PLAY_PAGE) {
            skipped += 1;
            continue;
        }
        let record =
            serde_json::from_value(value).map_err(|e| Error::malformed(path, idx + 1, e))?;
        records.push(record);
    }

    Ok((records, skipped))
}

/// Split a catalog record into its song and artist rows.
pub fn catalog_rows(record: SongRecord) -> CatalogRows {
    CatalogRows {
        song: SongRow {
            song_id: record.song_id,
            title: record.title,
            artist_id: record.artist_id.clone(),
            year: record.year,
            duration: record.duration,
        },
        artist: ArtistRow {
            artist_id: record.artist_id,
            name: record.artist_name,
            location: record.artist_location,
            latitude: record.artist_latitude,
            longitude: record.artist_longitude,
        },
    }
}

/// Filter a log file's records to song plays and derive their rows.
pub fn activity_rows(records: Vec<LogRecord>) -> Result<ActivityRows> {
    let mut rows = ActivityRows::default();

    for record in records {
        if !record.is_song_play() {
            rows.skipped += 1;
            continue;
        }

        rows.time.push(time_row(record.ts)?);
        rows.users.push(UserRow {
            user_id: record.user_id,
            first_name: record.first_name,
            last_name: record.last_name,
            gender: record.gender,
            level: record.level.clone(),
        });
        rows.plays.push(SongPlayCandidate {
            start_time: record.ts,
            user_id: record.user_id,
            level: record.level,
            session_id: record.session_id,
            location: record.location,
            user_agent: record.user_agent,
            song_title: record.song,
            artist_name: record.artist,
            length: record.length,
        });
    }

    Ok(rows)
}

/// Derive the calendar breakdown of a millisecond timestamp.
///
/// The timestamp is read as UTC. `week` follows ISO-8601, while `year` is
/// the calendar year, so 2021-01-01 lands in week 53 of year 2021.
pub fn time_row(ts_ms: i64) -> Result<TimeRow> {
    let dt = DateTime::from_timestamp_millis(ts_ms).ok_or(Error::InvalidTimestamp(ts_ms))?;

    Ok(TimeRow {
        start_time: ts_ms,
        hour: i64::from(dt.hour()),
        day: i64::from(dt.day()),
        week: i64::from(dt.iso_week().week()),
        month: i64::from(dt.month()),
        year: i64::from(dt.year()),
        weekday: dt.format("%A").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{activity_line, mock_log_record, mock_song_record};

    #[test]
    fn test_catalog_rows_split() {
        let rows = catalog_rows(SongRecord {
            artist_location: Some("Berlin".to_string()),
            artist_latitude: Some(52.52),
            artist_longitude: Some(13.40),
            ..mock_song_record()
        });

        assert_eq!(rows.song.song_id.as_deref(), Some("SOSC1"));
        assert_eq!(rows.song.title.as_deref(), Some("X"));
        assert_eq!(rows.song.artist_id.as_deref(), Some("AR1"));
        assert_eq!(rows.song.year, Some(2000));
        assert_eq!(rows.song.duration, Some(210.5));

        assert_eq!(rows.artist.artist_id.as_deref(), Some("AR1"));
        assert_eq!(rows.artist.name.as_deref(), Some("Y"));
        assert_eq!(rows.artist.location.as_deref(), Some("Berlin"));
        assert_eq!(rows.artist.latitude, Some(52.52));
        assert_eq!(rows.artist.longitude, Some(13.40));
    }

    #[test]
    fn test_catalog_rows_pass_nulls_through() {
        let rows = catalog_rows(SongRecord::default());
        assert_eq!(rows.song.song_id, None);
        assert_eq!(rows.artist.name, None);
    }

    #[test]
    fn test_activity_rows_filters_non_song_plays() {
        let records = vec![
            LogRecord {
                page: Some("Home".to_string()),
                ..mock_log_record()
            },
            mock_log_record(),
            LogRecord {
                page: Some("Logout".to_string()),
                ts: 2000,
                ..mock_log_record()
            },
        ];

        let rows = activity_rows(records).unwrap();
        assert_eq!(rows.time.len(), 1);
        assert_eq!(rows.users.len(), 1);
        assert_eq!(rows.plays.len(), 1);
        assert_eq!(rows.skipped, 2);
    }

    #[test]
    fn test_activity_rows_only_non_song_plays_yield_nothing() {
        let records = vec![
            LogRecord {
                page: Some("Settings".to_string()),
                ..mock_log_record()
            },
            LogRecord {
                page: None,
                ..mock_log_record()
            },
        ];

        let rows = activity_rows(records).unwrap();
        assert!(rows.time.is_empty());
        assert!(rows.users.is_empty());
        assert!(rows.plays.is_empty());
        assert_eq!(rows.skipped, 2);
    }

    #[test]
    fn test_activity_rows_fields() {
        let rows = activity_rows(vec![mock_log_record()]).unwrap();

        let user = &rows.users[0];
        assert_eq!(user.user_id, Some(7));
        assert_eq!(user.first_name.as_deref(), Some("A"));
        assert_eq!(user.last_name.as_deref(), Some("B"));
        assert_eq!(user.gender.as_deref(), Some("F"));
        assert_eq!(user.level.as_deref(), Some("free"));

        let play = &rows.plays[0];
        assert_eq!(play.start_time, 1000);
        assert_eq!(play.session_id, Some(1));
        assert_eq!(play.location.as_deref(), Some("L"));
        assert_eq!(play.user_agent.as_deref(), Some("UA"));
        assert_eq!(play.song_title.as_deref(), Some("X"));
        assert_eq!(play.artist_name.as_deref(), Some("Y"));
        assert_eq!(play.length, Some(210.5));

        assert_eq!(rows.time[0].start_time, 1000);
    }

    #[test]
    fn test_time_row_epoch_second() {
        let row = time_row(1000).unwrap();
        assert_eq!(row.start_time, 1000);
        assert_eq!(row.hour, 0);
        assert_eq!(row.day, 1);
        assert_eq!(row.week, 1);
        assert_eq!(row.month, 1);
        assert_eq!(row.year, 1970);
        assert_eq!(row.weekday, "Thursday");
    }

    #[test]
    fn test_time_row_known_event() {
        // 2018-11-11T02:33:56.796Z
        let row = time_row(1_541_903_636_796).unwrap();
        assert_eq!(row.hour, 2);
        assert_eq!(row.day, 11);
        assert_eq!(row.week, 45);
        assert_eq!(row.month, 11);
        assert_eq!(row.year, 2018);
        assert_eq!(row.weekday, "Sunday");
    }

    #[test]
    fn test_time_row_uses_iso_week() {
        // 2021-01-01T00:00:00Z is a Friday in ISO week 53 of 2020
        let row = time_row(1_609_459_200_000).unwrap();
        assert_eq!(row.week, 53);
        assert_eq!(row.year, 2021);
        assert_eq!(row.month, 1);
        assert_eq!(row.weekday, "Friday");
    }

    #[test]
    fn test_time_row_out_of_range() {
        let err = time_row(i64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp(i64::MAX)));
    }

    #[test]
    fn test_parse_lines_skips_blank_lines() {
        let contents = "{\"ts\":1,\"page\":\"NextSong\"}\n\n   \n{\"ts\":2}\n";
        let records: Vec<LogRecord> = parse_lines(Path::new("log.json"), contents).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].ts, 2);
    }

    #[test]
    fn test_parse_lines_reports_line_number() {
        let contents = "{\"ts\":1}\n{\"ts\":\"soon\"}\n";
        let err = parse_lines::<LogRecord>(Path::new("log.json"), contents).unwrap_err();
        match err {
            Error::MalformedRecord { line, path, .. } => {
                assert_eq!(line, 2);
                assert_eq!(path, Path::new("log.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_song_plays_drops_loose_events() {
        let contents = [
            activity_line(&mock_log_record()),
            r#"{"page":"Home","userId":"","auth":"Logged Out"}"#.to_string(),
            r#"{"page":"Settings","ts":"later","sessionId":"abc","userId":"abc"}"#.to_string(),
            r#"[1, 2, 3]"#.to_string(),
            String::new(),
        ]
        .join("\n");

        let (records, skipped) = parse_song_plays(Path::new("log.json"), &contents).unwrap();
        assert_eq!(records, vec![mock_log_record()]);
        assert_eq!(skipped, 3);
    }

    #[test]
    fn test_parse_song_plays_checks_kept_lines() {
        let contents = "{\"page\":\"Home\"}\n{\"page\":\"NextSong\",\"ts\":\"soon\"}\n";
        let err = parse_song_plays(Path::new("log.json"), contents).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 2, .. }));

        let err = parse_song_plays(Path::new("log.json"), "{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { line: 1, .. }));
    }
}
