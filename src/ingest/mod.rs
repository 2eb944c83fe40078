//! File-set processing: discover input files and load them one transaction
//! per file.
//!
//! Each directory tree is processed by a [`FileHandler`]. The processor
//! discovers files, runs the handler on each inside its own transaction, and
//! commits before moving on. A handler error rolls that file back and stops
//! the run; files committed earlier stay committed.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingest::{process_data, SongFileHandler, LogFileHandler};
//!
//! let mut conn = db::init_db(url).await?;
//! process_data(&mut conn, Path::new("data/song_data"), "json", &SongFileHandler).await?;
//! process_data(&mut conn, Path::new("data/log_data"), "json", &LogFileHandler).await?;
//! ```

mod handlers;

use std::ops::AddAssign;
use std::path::Path;

use async_trait::async_trait;
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, info};

use crate::error::{Result, ResultExt};
use crate::scanner;

pub use handlers::{LogFileHandler, SongFileHandler};

/// Loads the records of one input file.
///
/// Implementations run inside the processor's per-file transaction and
/// must not commit themselves.
#[async_trait]
pub trait FileHandler: Send + Sync {
    /// Short name used in logs (e.g. "songs").
    fn name(&self) -> &str;

    /// Transform and load every record of `path`.
    async fn process_file(&self, conn: &mut SqliteConnection, path: &Path) -> Result<FileReport>;
}

/// Rows written while loading one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileReport {
    pub songs: usize,
    pub artists: usize,
    pub time_rows: usize,
    pub users: usize,
    pub songplays: usize,
    /// Songplays loaded without song/artist ids
    pub unmatched: usize,
    /// Activity events dropped by the page filter
    pub skipped: usize,
}

impl AddAssign for FileReport {
    fn add_assign(&mut self, other: Self) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.time_rows += other.time_rows;
        self.users += other.users;
        self.songplays += other.songplays;
        self.unmatched += other.unmatched;
        self.skipped += other.skipped;
    }
}

/// Outcome of processing one directory tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub files_found: usize,
    pub files_processed: usize,
    /// Totals over all processed files
    pub rows: FileReport,
}

/// Process every matching file below `root` with `handler`.
///
/// Files are visited in sorted order. After each file the transaction is
/// committed and progress is printed as `i/n files processed.`.
///
/// # Errors
///
/// The first handler or commit error aborts the run. The failing file's
/// writes are rolled back; earlier files remain committed.
pub async fn process_data(
    conn: &mut SqliteConnection,
    root: &Path,
    extension: &str,
    handler: &dyn FileHandler,
) -> Result<ProcessSummary> {
    let files = scanner::discover(root, extension);
    let num_files = files.len();
    println!("{} files found in {}", num_files, root.display());
    info!(handler = handler.name(), root = %root.display(), files = num_files, "Discovered input files");

    let mut summary = ProcessSummary {
        files_found: num_files,
        ..Default::default()
    };

    for (i, path) in files.iter().enumerate() {
        // Dropping an uncommitted transaction rolls it back
        let mut tx = conn.begin().await?;
        let report = handler
            .process_file(&mut *tx, path)
            .await
            .with_context(format!("processing {}", path.display()))?;
        tx.commit().await?;

        summary.files_processed += 1;
        summary.rows += report;
        debug!(file = %path.display(), ?report, "File committed");
        println!("{}/{} files processed.", i + 1, num_files);
    }

    info!(handler = handler.name(), ?summary, "Finished directory tree");
    Ok(summary)
}
