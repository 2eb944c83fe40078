//! The ETL run: catalog tree first, then the activity log tree.

use std::path::Path;
use sqlx::Connection;
use tokio::runtime::Runtime;
use tracing::info;

use crate::db;
use crate::ingest::{self, LogFileHandler, SongFileHandler};

/// Load every catalog file, then every log file, committing per file.
///
/// Catalog files go first so the key resolver can link songplays to the
/// songs and artists they reference.
pub fn cmd_run(
    rt: &Runtime,
    db_url: &str,
    song_root: &Path,
    log_root: &Path,
    extension: &str,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let mut conn = db::init_db(db_url).await?;

        let songs =
            ingest::process_data(&mut conn, song_root, extension, &SongFileHandler).await?;
        let logs = ingest::process_data(&mut conn, log_root, extension, &LogFileHandler).await?;

        info!(
            song_files = songs.files_found,
            log_files = logs.files_found,
            songplays = logs.rows.songplays,
            unmatched = logs.rows.unmatched,
            "ETL run complete"
        );

        let counts = db::table_counts(&mut conn).await?;
        println!("Loaded tables: {}", counts);

        conn.close().await?;
        Ok::<(), anyhow::Error>(())
    })
}
