//! Import command handlers

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use log::warn;

use super::{ImportCommands, PreviewArgs, RunArgs};
use crate::api::DirectoryClient;
use crate::config;
use crate::geocode::{CachedGeocoder, Geocoder, HttpGeocoder, NullGeocoder};
use crate::import::{self, CancelFlag, ImportOptions, ImportReport};

pub async fn handle_import_command(command: ImportCommands) -> Result<()> {
    match command {
        ImportCommands::Run(args) => run(args).await,
        ImportCommands::Preview(args) => preview(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = config::load()?;
    if let Some(collection) = args.collection {
        config.cms.collection = collection;
    }

    let (data, file_name) = read_roster_file(&args.file)?;
    let replace = !args.append;

    // Only prompt on an interactive terminal; automation relies on the
    // unconditional replace behavior.
    if replace && !args.yes && io::stdin().is_terminal() {
        let prompt = format!(
            "This will delete every entry in the '{}' collection before importing. Continue?",
            config.cms.collection
        );
        if !Confirm::new().with_prompt(prompt).default(false).interact()? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let retry = config.retry.to_retry_config();
    let store = DirectoryClient::new(&config.cms, config::cms_token()?, retry.clone())?;

    let geocoder: Box<dyn Geocoder> = match config::geocode_token() {
        Some(token) => Box::new(CachedGeocoder::new(HttpGeocoder::new(
            &config.geocode,
            token,
            retry,
        ))),
        None => {
            warn!(
                "{} is not set; rows without direct coordinates will import without a location",
                config::GEOCODE_TOKEN_VAR
            );
            Box::new(NullGeocoder)
        }
    };

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let options = ImportOptions { replace, cancel };
    let report = import::run_import(&data, &file_name, &store, geocoder.as_ref(), &options).await?;

    render_report(&report);

    if let Some(path) = args.report {
        import::report::write_report_excel(&report, &path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

async fn preview(args: PreviewArgs) -> Result<()> {
    let (data, file_name) = read_roster_file(&args.file)?;
    let preview = import::preview_rows(&data, &file_name)?;

    println!();
    for row in &preview.rows {
        let location = match (&row.draft.location, &row.pending_address) {
            (Some(coordinates), _) => {
                format!("{}, {}", coordinates.latitude, coordinates.longitude)
            }
            (None, Some(address)) => format!("would geocode '{}'", address).dimmed().to_string(),
            (None, None) => "no location".dimmed().to_string(),
        };
        println!(
            "Row {}: {} ({})",
            row.row_num,
            row.draft.shop_name.bold(),
            location
        );
        if let Some(website) = &row.draft.website {
            println!("        website: {}", website);
        }
        if let Some(phone) = &row.draft.phone {
            println!("        phone:   {}", phone);
        }
    }
    for message in &preview.error_messages {
        println!("  {}", message.red());
    }
    println!();
    println!(
        "{} rows would be imported, {} rejected",
        preview.rows.len().to_string().green().bold(),
        preview.error_messages.len().to_string().red().bold()
    );
    Ok(())
}

fn read_roster_file(path: &Path) -> Result<(Vec<u8>, String)> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read roster file: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((data, file_name))
}

fn render_report(report: &ImportReport) {
    println!();
    if let Some(deleted) = report.deleted_count {
        println!("Deleted {} existing entries", deleted);
    }
    for message in &report.success_messages {
        println!("  {}", message.green());
    }
    for message in &report.error_messages {
        println!("  {}", message.red());
    }
    println!();
    println!(
        "{} created, {} errors",
        report.created_count().to_string().green().bold(),
        report.error_count().to_string().red().bold()
    );
    if report.cancelled {
        println!("{}", "Import cancelled before all rows were processed".yellow());
    }
}
