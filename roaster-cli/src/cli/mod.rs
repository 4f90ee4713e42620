//! Command-line interface definitions

pub mod commands;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::import::ImportCommands;

#[derive(Parser)]
#[command(
    name = "roaster-cli",
    version,
    about = "Import coffee roaster rosters into the directory collection of a headless CMS"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a roster spreadsheet into the directory collection
    #[command(subcommand)]
    Import(ImportCommands),
    /// Inspect the resolved configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}
