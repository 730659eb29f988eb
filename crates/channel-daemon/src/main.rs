//! Channel search CLI
//!
//! # Usage
//!
//! ```bash
//! channel-search engines
//! channel-search autocomplete --fixtures fixtures.json --team TEAM --term TERM [--include-deleted]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/channel-search/config.toml)
//! 3. `--config` file
//! 4. Environment variables (CHANNEL_SEARCH_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use channel_daemon::{run_autocomplete, show_engines, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Engines => {
            show_engines(cli.config.as_deref(), cli.log_level.as_deref())?;
        }
        Commands::Autocomplete {
            fixtures,
            team,
            term,
            include_deleted,
        } => {
            run_autocomplete(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &fixtures,
                &team,
                &term,
                include_deleted,
            )
            .await?;
        }
    }

    Ok(())
}
