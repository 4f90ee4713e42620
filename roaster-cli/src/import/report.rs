//! Write an import report to an Excel workbook
//!
//! Operators fix rejected rows by hand; the workbook gives them the full
//! message list next to a run summary, in a format they can filter and
//! annotate.

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use super::types::ImportReport;

/// Column indices for the messages sheet
mod cols {
    pub const STATUS: u16 = 0;
    pub const MESSAGE: u16 = 1;
}

/// Write the report workbook to `path`.
pub fn write_report_excel(report: &ImportReport, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(report)?;
    workbook
        .save(path)
        .with_context(|| format!("Failed to save report file: {}", path.display()))?;
    Ok(())
}

fn build_workbook(report: &ImportReport) -> Result<Workbook> {
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    write_summary(summary, report)?;

    let messages = workbook.add_worksheet();
    messages.set_name("Messages")?;
    write_messages(messages, report)?;

    Ok(workbook)
}

fn write_summary(ws: &mut Worksheet, report: &ImportReport) -> Result<()> {
    let rows: Vec<(&str, String)> = vec![
        ("started", report.started_at.to_rfc3339()),
        ("finished", report.finished_at.to_rfc3339()),
        ("created", report.created_count().to_string()),
        ("errors", report.error_count().to_string()),
        (
            "deleted before import",
            report
                .deleted_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("cancelled", report.cancelled.to_string()),
    ];

    for (row, (label, value)) in rows.iter().enumerate() {
        ws.write_string(row as u32, 0, *label)?;
        ws.write_string(row as u32, 1, value)?;
    }
    Ok(())
}

fn write_messages(ws: &mut Worksheet, report: &ImportReport) -> Result<()> {
    ws.write_string(0, cols::STATUS, "status")?;
    ws.write_string(0, cols::MESSAGE, "message")?;

    let mut row: u32 = 1;
    for message in &report.success_messages {
        ws.write_string(row, cols::STATUS, "created")?;
        ws.write_string(row, cols::MESSAGE, message)?;
        row += 1;
    }
    for message in &report.error_messages {
        ws.write_string(row, cols::STATUS, "error")?;
        ws.write_string(row, cols::MESSAGE, message)?;
        row += 1;
    }
    Ok(())
}
