//! Application-wide error types.
//!
//! Library modules return [`Result`] with the [`Error`] enum below, while
//! the CLI layer uses `anyhow` for convenient error propagation.
//!
//! # Example
//!
//! ```ignore
//! use songplay_etl::error::{Result, ResultExt};
//!
//! fn load(path: &Path) -> Result<()> {
//!     let text = std::fs::read_to_string(path).with_context("reading log file")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store error, including constraint violations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A line that is not valid JSON or does not fit the record shape
    #[error("Malformed record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Millisecond timestamp outside the representable calendar range
    #[error("Invalid timestamp: {0} ms")]
    InvalidTimestamp(i64),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed record error.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            source,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
