//! roaster-cli entry point

mod api;
mod cli;
mod config;
mod geocode;
mod import;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so API tokens and RUST_LOG from it are visible.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Import(command) => cli::commands::import::handle_import_command(command).await,
        Commands::Config(command) => cli::commands::config::handle_config_command(command).await,
    }
}
