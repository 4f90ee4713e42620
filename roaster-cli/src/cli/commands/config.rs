//! Configuration inspection commands

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration with secrets redacted
    Show,
}

pub async fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
    }
}

fn show() -> Result<()> {
    match config::config_path() {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} {}", path.display(), "(not found, using defaults)".dimmed()),
        None => println!("Config file: {}", "no platform config dir, using defaults".dimmed()),
    }
    println!();

    let config = config::load()?;
    print!("{}", toml::to_string_pretty(&config)?);
    println!();

    let cms_token = if config::cms_token().is_ok() { "set".green() } else { "not set".red() };
    let geocode_token = if config::geocode_token().is_some() { "set".green() } else { "not set".yellow() };
    println!("{}: {}", config::CMS_TOKEN_VAR, cms_token);
    println!("{}: {}", config::GEOCODE_TOKEN_VAR, geocode_token);
    Ok(())
}
