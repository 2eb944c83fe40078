//! Handlers for the two input trees: song catalog and activity logs.

use std::path::Path;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use super::{FileHandler, FileReport};
use crate::db;
use crate::error::{Result, ResultExt};
use crate::model::SongRecord;
use crate::transform;

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(format!("reading {}", path.display()))
}

/// Loads song catalog files into `songs` and `artists`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SongFileHandler;

#[async_trait]
impl FileHandler for SongFileHandler {
    fn name(&self) -> &str {
        "songs"
    }

    async fn process_file(&self, conn: &mut SqliteConnection, path: &Path) -> Result<FileReport> {
        let contents = read_file(path).await?;
        let records: Vec<SongRecord> = transform::parse_lines(path, &contents)?;
        let mut report = FileReport::default();

        for record in records {
            let rows = transform::catalog_rows(record);
            db::insert_song(conn, &rows.song).await?;
            report.songs += 1;
            db::upsert_artist(conn, &rows.artist).await?;
            report.artists += 1;
        }

        Ok(report)
    }
}

/// Loads activity log files into `time`, `users` and `songplays`.
///
/// Time rows go in first, then users, then songplays, so every songplay
/// finds its user already present.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFileHandler;

#[async_trait]
impl FileHandler for LogFileHandler {
    fn name(&self) -> &str {
        "logs"
    }

    async fn process_file(&self, conn: &mut SqliteConnection, path: &Path) -> Result<FileReport> {
        let contents = read_file(path).await?;
        let (records, dropped) = transform::parse_song_plays(path, &contents)?;
        let rows = transform::activity_rows(records)?;
        let mut report = FileReport {
            skipped: dropped + rows.skipped,
            ..Default::default()
        };

        for row in &rows.time {
            db::insert_time(conn, row).await?;
            report.time_rows += 1;
        }

        for row in &rows.users {
            db::upsert_user(conn, row).await?;
            report.users += 1;
        }

        for candidate in rows.plays {
            let key = db::find_song(
                conn,
                candidate.song_title.as_deref(),
                candidate.artist_name.as_deref(),
                candidate.length,
            )
            .await?;
            if key.is_none() {
                report.unmatched += 1;
            }

            let id = db::insert_songplay(conn, &candidate.resolve(key)).await?;
            tracing::trace!(songplay_id = id, "Songplay inserted");
            report.songplays += 1;
        }

        Ok(report)
    }
}
