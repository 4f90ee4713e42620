//! Roster import commands

pub mod handler;

pub use handler::handle_import_command;

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Parse a roster file and import every row into the CMS
    Run(RunArgs),
    /// Parse a roster file and show what would be imported
    Preview(PreviewArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the roster file (.xlsx or delimited text)
    pub file: PathBuf,

    /// Keep existing entries instead of replacing the collection
    #[arg(long)]
    pub append: bool,

    /// Skip the confirmation prompt before deleting existing entries
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Write a results workbook to this path after the import
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Override the configured target collection
    #[arg(long)]
    pub collection: Option<String>,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Path to the roster file (.xlsx or delimited text)
    pub file: PathBuf,
}
