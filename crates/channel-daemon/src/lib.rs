//! Channel search binary library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (engines, autocomplete)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    autocomplete_with_fixtures, build_registry, init_logging, load_settings, run_autocomplete,
    show_engines, Fixtures,
};
