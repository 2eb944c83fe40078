//! Store maintenance commands.

use sqlx::Connection;
use tokio::runtime::Runtime;

use crate::db::{self, schema};

/// Create the schema, optionally dropping existing tables first.
pub fn cmd_init_db(rt: &Runtime, db_url: &str, reset: bool) -> anyhow::Result<()> {
    rt.block_on(async {
        let mut conn = db::connect(db_url).await?;
        if reset {
            schema::drop_tables(&mut conn).await?;
        }
        schema::create_tables(&mut conn).await?;
        println!("Tables ready in {}", db_url);
        conn.close().await?;
        Ok::<(), anyhow::Error>(())
    })
}

/// Print row counts for every table.
pub fn cmd_stats(rt: &Runtime, db_url: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let mut conn = db::init_db(db_url).await?;
        let counts = db::table_counts(&mut conn).await?;
        for (table, n) in schema::TABLES.iter().zip([
            counts.songs,
            counts.artists,
            counts.users,
            counts.time,
            counts.songplays,
        ]) {
            println!("{:<10} {}", table, n);
        }
        conn.close().await?;
        Ok::<(), anyhow::Error>(())
    })
}
