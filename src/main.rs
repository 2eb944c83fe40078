//! Songplay ETL - load a music service's song catalog and activity logs
//! into a star schema.
//!
//! Reads newline-delimited JSON from two directory trees, reshapes it into
//! `songs`, `artists`, `users`, `time` and `songplays`, links each songplay
//! to its song and artist, and commits once per input file.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;
pub mod transform;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging; progress lines go to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("songplay_etl=info".parse()?))
        .init();

    cli::run_command(&args)
}
