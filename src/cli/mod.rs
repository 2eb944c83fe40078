//! Command-line interface for songplay-etl.
//!
//! Running without a subcommand performs a full ETL run with the configured
//! defaults, like `songplay-etl run`.

mod commands;

pub use commands::{Cli, Commands, run_command};
