//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `run`: The ETL job itself (catalog tree, then log tree)
//! - `store`: Schema setup and row counts

mod run;
mod store;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::runtime::Builder;

use crate::config::{self, Config};

pub use run::cmd_run;
pub use store::{cmd_init_db, cmd_stats};

/// Environment variable holding the store connection URL.
pub const DATABASE_URL_ENV: &str = "SONGPLAY_ETL_DATABASE_URL";

/// Songplay ETL: load song catalog and activity logs into a star schema
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: OS config dir, songplay-etl/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store connection URL, e.g. sqlite:songplays.db
    #[arg(long, global = true, env = DATABASE_URL_ENV)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Process the song catalog tree, then the activity log tree
    Run {
        /// Root of the song catalog tree
        #[arg(long)]
        song_data: Option<PathBuf>,
        /// Root of the activity log tree
        #[arg(long)]
        log_data: Option<PathBuf>,
    },
    /// Create the tables if they don't exist
    InitDb {
        /// Drop all tables first, discarding loaded data
        #[arg(long)]
        reset: bool,
    },
    /// Print row counts for every table
    Stats,
}

/// Run the specified CLI command.
///
/// No subcommand means a full run with configured defaults.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    // The job is strictly sequential: one thread, one connection
    let rt = Builder::new_current_thread().enable_all().build()?;
    let config = load_config(cli.config.as_deref())?;
    let db_url = database_url(cli, &config);

    match &cli.command {
        Some(Commands::Run {
            song_data,
            log_data,
        }) => {
            let song_root = song_data.as_ref().unwrap_or(&config.data.song_data);
            let log_root = log_data.as_ref().unwrap_or(&config.data.log_data);
            cmd_run(&rt, &db_url, song_root, log_root, &config.data.extension)
        }
        Some(Commands::InitDb { reset }) => cmd_init_db(&rt, &db_url, *reset),
        Some(Commands::Stats) => cmd_stats(&rt, &db_url),
        None => cmd_run(
            &rt,
            &db_url,
            &config.data.song_data,
            &config.data.log_data,
            &config.data.extension,
        ),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Load the named config file, or the default one if none was named.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Ok(config::load_from(p)?),
        None => Ok(config::load()),
    }
}

/// CLI flag or environment first, then the config file.
fn database_url(cli: &Cli, config: &Config) -> String {
    cli.db.clone().unwrap_or_else(|| config.database.url.clone())
}

/// Build the runtime used by command handlers.
#[cfg(test)]
pub(crate) fn test_runtime() -> tokio::runtime::Runtime {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}
