//! Table definitions for the songplay star schema.
//!
//! `songplays` is the fact table; `users`, `songs`, `artists` and `time` are
//! its dimensions. Creation is idempotent (`IF NOT EXISTS`). Drop order puts
//! the fact table first so its foreign keys never dangle.

use sqlx::SqliteConnection;

pub const USERS_CREATE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id INT NOT NULL PRIMARY KEY,
        first_name TEXT,
        last_name TEXT,
        gender TEXT,
        level TEXT
    )
"#;

// artist_id names an artist but carries no REFERENCES clause: a catalog line
// inserts its song before its artist.
pub const SONGS_CREATE: &str = r#"
    CREATE TABLE IF NOT EXISTS songs (
        song_id TEXT NOT NULL PRIMARY KEY,
        title TEXT,
        artist_id TEXT,
        year INT CHECK (year >= 0),
        duration REAL
    )
"#;

pub const ARTISTS_CREATE: &str = r#"
    CREATE TABLE IF NOT EXISTS artists (
        artist_id TEXT NOT NULL PRIMARY KEY,
        name TEXT NOT NULL,
        location TEXT,
        latitude REAL,
        longitude REAL
    )
"#;

pub const TIME_CREATE: &str = r#"
    CREATE TABLE IF NOT EXISTS time (
        start_time INT NOT NULL PRIMARY KEY,
        hour INT NOT NULL CHECK (hour >= 0),
        day INT NOT NULL CHECK (day >= 0),
        week INT NOT NULL CHECK (week >= 0),
        month INT NOT NULL CHECK (month >= 0),
        year INT NOT NULL CHECK (year >= 0),
        weekday TEXT NOT NULL
    )
"#;

// INT (not INTEGER) keeps user_id out of the rowid alias, so a NULL id is
// rejected instead of auto-assigned.
pub const SONGPLAYS_CREATE: &str = r#"
    CREATE TABLE IF NOT EXISTS songplays (
        songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
        start_time INT NOT NULL,
        user_id INT NOT NULL REFERENCES users (user_id),
        level TEXT NOT NULL,
        song_id TEXT REFERENCES songs (song_id),
        artist_id TEXT REFERENCES artists (artist_id),
        session_id INT NOT NULL,
        location TEXT,
        user_agent TEXT
    )
"#;

/// Creation order: dimensions before the fact table.
pub const CREATE_TABLES: [&str; 5] = [
    USERS_CREATE,
    ARTISTS_CREATE,
    SONGS_CREATE,
    TIME_CREATE,
    SONGPLAYS_CREATE,
];

/// Drop order: fact table first.
pub const DROP_TABLES: [&str; 5] = [
    "DROP TABLE IF EXISTS songplays",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS songs",
    "DROP TABLE IF EXISTS artists",
    "DROP TABLE IF EXISTS time",
];

/// Table names in reporting order.
pub const TABLES: [&str; 5] = ["songs", "artists", "users", "time", "songplays"];

/// Create all five tables if they don't exist yet.
pub async fn create_tables(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    tracing::debug!(tables = CREATE_TABLES.len(), "Schema ensured");
    Ok(())
}

/// Drop all five tables, discarding their contents.
pub async fn drop_tables(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    for statement in DROP_TABLES {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    tracing::info!("Dropped all tables");
    Ok(())
}
