//! Database module: store connection, row loading and key resolution.
//!
//! Uses SQLx with SQLite. A single long-lived [`SqliteConnection`] is opened
//! per run and handed explicitly to every operation; there is no pool.
//! Provides:
//! - Per-table loaders with the conflict policy each dimension needs
//! - The song/artist key lookup used to link songplays
//! - Row counts for reporting
//!
//! # Example
//!
//! ```ignore
//! use songplay_etl::db::{init_db, insert_song};
//!
//! let mut conn = init_db("sqlite:songplays.db").await?;
//! insert_song(&mut conn, &row).await?;
//! ```

pub mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;

use crate::model::{ArtistRow, SongKey, SongPlayRow, SongRow, TimeRow, UserRow};

/// Open a connection to the store.
///
/// Creates the database file if it doesn't exist and turns on foreign key
/// enforcement.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the connection cannot be
/// established.
pub async fn connect(db_url: &str) -> sqlx::Result<SqliteConnection> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let conn = SqliteConnection::connect_with(&options).await?;
    tracing::info!(url = %db_url, "Connected to store");
    Ok(conn)
}

/// Open a connection and ensure all tables exist.
pub async fn init_db(db_url: &str) -> sqlx::Result<SqliteConnection> {
    let mut conn = connect(db_url).await?;
    schema::create_tables(&mut conn).await?;
    Ok(conn)
}

// ============================================================================
// Loaders
// ============================================================================

/// Insert a song unless its id is already present.
///
/// Songs are immutable once loaded: the first write wins.
pub async fn insert_song(conn: &mut SqliteConnection, row: &SongRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (song_id, title, artist_id, year, duration)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (song_id) DO NOTHING
        "#,
    )
    .bind(&row.song_id)
    .bind(&row.title)
    .bind(&row.artist_id)
    .bind(row.year)
    .bind(row.duration)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert an artist, or refresh location and coordinates if it exists.
///
/// Id and name are fixed at first insert.
pub async fn upsert_artist(conn: &mut SqliteConnection, row: &ArtistRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO artists (artist_id, name, location, latitude, longitude)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (artist_id) DO UPDATE SET
            location = excluded.location,
            latitude = excluded.latitude,
            longitude = excluded.longitude
        "#,
    )
    .bind(&row.artist_id)
    .bind(&row.name)
    .bind(&row.location)
    .bind(row.latitude)
    .bind(row.longitude)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a user, or update only the subscription level if it exists.
pub async fn upsert_user(conn: &mut SqliteConnection, row: &UserRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, first_name, last_name, gender, level)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET level = excluded.level
        "#,
    )
    .bind(row.user_id)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.gender)
    .bind(&row.level)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Insert a time row unless its timestamp is already present.
pub async fn insert_time(conn: &mut SqliteConnection, row: &TimeRow) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO time (start_time, hour, day, week, month, year, weekday)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (start_time) DO NOTHING
        "#,
    )
    .bind(row.start_time)
    .bind(row.hour)
    .bind(row.day)
    .bind(row.week)
    .bind(row.month)
    .bind(row.year)
    .bind(&row.weekday)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Append a songplay fact row.
///
/// Never deduplicated: loading the same event twice yields two rows.
///
/// # Returns
///
/// The id assigned by the store.
pub async fn insert_songplay(conn: &mut SqliteConnection, row: &SongPlayRow) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO songplays (
            start_time, user_id, level, song_id, artist_id,
            session_id, location, user_agent
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.start_time)
    .bind(row.user_id)
    .bind(&row.level)
    .bind(&row.song_id)
    .bind(&row.artist_id)
    .bind(row.session_id)
    .bind(&row.location)
    .bind(&row.user_agent)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

// ============================================================================
// Key Resolution
// ============================================================================

/// Look up the song and artist ids for a played song.
///
/// All three predicates must hold: title equality, artist name equality
/// through the artists join, and exact duration equality. Durations are
/// compared as stored floats with no tolerance, so a log length that differs
/// in the last bit from the catalog duration finds nothing. A `None` input
/// never matches.
///
/// # Returns
///
/// The first matching pair, or `None`.
pub async fn find_song(
    conn: &mut SqliteConnection,
    title: Option<&str>,
    artist_name: Option<&str>,
    duration: Option<f64>,
) -> sqlx::Result<Option<SongKey>> {
    sqlx::query_as::<_, SongKey>(
        r#"
        SELECT s.song_id, s.artist_id
        FROM songs s
        JOIN artists a ON s.artist_id = a.artist_id
        WHERE s.title = ? AND a.name = ? AND s.duration = ?
        LIMIT 1
        "#,
    )
    .bind(title)
    .bind(artist_name)
    .bind(duration)
    .fetch_optional(&mut *conn)
    .await
}

// ============================================================================
// Reporting
// ============================================================================

/// Row counts of the five tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: i64,
    pub artists: i64,
    pub users: i64,
    pub time: i64,
    pub songplays: i64,
}

impl std::fmt::Display for TableCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "songs: {}, artists: {}, users: {}, time: {}, songplays: {}",
            self.songs, self.artists, self.users, self.time, self.songplays
        )
    }
}

/// Count the rows of every table.
pub async fn table_counts(conn: &mut SqliteConnection) -> sqlx::Result<TableCounts> {
    let mut counts = [0i64; 5];
    for (slot, table) in counts.iter_mut().zip(schema::TABLES) {
        // Table names come from a fixed list, never from input
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut *conn)
            .await?;
        *slot = n;
    }

    let [songs, artists, users, time, songplays] = counts;
    Ok(TableCounts {
        songs,
        artists,
        users,
        time,
        songplays,
    })
}
