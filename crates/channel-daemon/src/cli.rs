//! CLI argument parsing for the channel search binary.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Channel search layer
///
/// Indexes channels into the configured search engines and answers
/// channel autocomplete with store fallback.
#[derive(Parser, Debug)]
#[command(name = "channel-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/channel-search/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured engines and their capabilities
    Engines,

    /// Seed fixtures through the search layer and run one autocomplete
    Autocomplete {
        /// JSON file with users, channels and members
        #[arg(short, long)]
        fixtures: PathBuf,

        /// Team to search in
        #[arg(long)]
        team: String,

        /// Search term (prefix)
        #[arg(long, default_value = "")]
        term: String,

        /// Keep soft-deleted channels in the result
        #[arg(long)]
        include_deleted: bool,
    },
}
