//! The roster import pipeline
//!
//! Transforms an uploaded roster table into a sequence of directory-entry
//! create operations. Row processing is strictly sequential in source
//! order; every row-level failure is recorded in the report and the batch
//! continues. Only an unreadable file or a missing shop-name column aborts
//! the whole operation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::api::DirectoryStore;
use crate::geocode::Geocoder;

use super::columns::{ColumnMap, detect_columns};
use super::table::parse_table;
use super::types::{Coordinates, EntryDraft, ImportError, ImportReport};

/// Cooperative cancellation flag shared with the caller.
///
/// When set, the row loop stops after the current row completes and the
/// partial report collected so far is returned.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-invocation pipeline options.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Delete all pre-existing entries before importing. Best-effort: a
    /// failed delete is recorded as a warning and the import runs anyway.
    pub replace: bool,
    pub cancel: CancelFlag,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            replace: true,
            cancel: CancelFlag::new(),
        }
    }
}

/// Run the full import pipeline over a roster buffer.
///
/// `file_name` is used in diagnostics only. Returns `Err` for whole-file
/// failures (unparseable buffer, missing shop-name column); every other
/// condition is captured in the returned report.
pub async fn run_import(
    data: &[u8],
    file_name: &str,
    store: &dyn DirectoryStore,
    geocoder: &dyn Geocoder,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let table = parse_table(data, file_name)?;
    info!(
        "import {}: parsed '{}', {} data rows",
        run_id,
        file_name,
        table.rows.len()
    );

    let mut report = ImportReport {
        success_messages: Vec::new(),
        error_messages: Vec::new(),
        deleted_count: None,
        started_at,
        finished_at: started_at,
        cancelled: false,
    };

    // The delete phase runs before header detection, so a header failure
    // after a successful delete leaves the collection empty. Delete and
    // import are two independent phases with no rollback.
    if options.replace {
        match store.delete_all_entries().await {
            Ok(count) => {
                info!("import {}: deleted {} existing entries", run_id, count);
                report.deleted_count = Some(count);
            }
            Err(err) => {
                warn!("import {}: delete phase failed: {:#}", run_id, err);
                report.error_messages.push(format!(
                    "Warning: failed to delete existing entries, importing anyway: {:#}",
                    err
                ));
            }
        }
    }

    let columns = detect_columns(&table.headers)?;

    for (index, row) in table.rows.iter().enumerate() {
        if options.cancel.is_cancelled() {
            info!("import {}: cancelled after {} rows", run_id, index);
            report.cancelled = true;
            break;
        }
        // Header is row 1, so the first data row is row 2.
        let row_num = index + 2;

        let assembled = match assemble_row(row, row_num, &columns) {
            RowParse::Skip => {
                debug!("import {}: skipping empty row {}", run_id, row_num);
                continue;
            }
            RowParse::Error(message) => {
                report.error_messages.push(message);
                continue;
            }
            RowParse::Row(assembled) => assembled,
        };

        // Direct coordinates win unconditionally over geocoding, even when
        // an address is also present.
        let location = if assembled.direct_location.is_some() {
            assembled.direct_location
        } else if let Some(address) = &assembled.address {
            match geocoder.geocode(address).await {
                Some(coordinates) => Some(coordinates),
                None => {
                    report.error_messages.push(format!(
                        "Row {}: could not geocode address '{}' for '{}'",
                        row_num, address, assembled.shop_name
                    ));
                    None
                }
            }
        } else {
            None
        };

        let draft = EntryDraft {
            shop_name: assembled.shop_name,
            location,
            website: assembled.website,
            phone: assembled.phone,
        };

        match store.create_entry(&draft).await {
            Ok(id) => {
                debug!("import {}: row {} created entry {}", run_id, row_num, id);
                report
                    .success_messages
                    .push(format!("Row {}: created entry for '{}'", row_num, draft.shop_name));
            }
            Err(err) => {
                report.error_messages.push(format!(
                    "Row {}: failed to create entry for '{}': {:#}",
                    row_num, draft.shop_name, err
                ));
            }
        }
    }

    report.finished_at = Utc::now();
    info!(
        "import {}: finished, {} created, {} errors",
        run_id,
        report.created_count(),
        report.error_count()
    );
    Ok(report)
}

/// One roster row, extracted and validated but not yet geocoded.
struct AssembledRow {
    shop_name: String,
    direct_location: Option<Coordinates>,
    address: Option<String>,
    website: Option<String>,
    phone: Option<String>,
}

enum RowParse {
    /// Row has no content at all; skipped silently.
    Skip,
    /// Row-level validation failure, already formatted for the report.
    Error(String),
    Row(AssembledRow),
}

fn assemble_row(row: &[String], row_num: usize, columns: &ColumnMap) -> RowParse {
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return RowParse::Skip;
    }

    let Some(shop_name) = cell(row, Some(columns.shop_name)) else {
        return RowParse::Error(format!("Row {}: missing shop name", row_num));
    };

    RowParse::Row(AssembledRow {
        shop_name,
        direct_location: direct_location(row, columns),
        address: cell(row, columns.address),
        website: cell(row, columns.website),
        phone: cell(row, columns.phone),
    })
}

/// Trimmed, non-empty cell value at an optional column index.
fn cell(row: &[String], index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| row.get(i))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Coordinates taken directly from the spreadsheet. Both cells must parse
/// as finite decimals; otherwise the row falls back to geocoding.
fn direct_location(row: &[String], columns: &ColumnMap) -> Option<Coordinates> {
    let latitude = parse_finite(cell(row, columns.latitude)?)?;
    let longitude = parse_finite(cell(row, columns.longitude)?)?;
    Some(Coordinates { latitude, longitude })
}

fn parse_finite(value: String) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Preview of what an import would do, with no external calls.
#[derive(Debug)]
pub struct Preview {
    pub rows: Vec<PreviewRow>,
    pub error_messages: Vec<String>,
}

#[derive(Debug)]
pub struct PreviewRow {
    pub row_num: usize,
    pub draft: EntryDraft,
    /// Address that would be geocoded during a real run.
    pub pending_address: Option<String>,
}

/// Parse and assemble drafts without touching the CMS or the geocoder.
pub fn preview_rows(data: &[u8], file_name: &str) -> Result<Preview, ImportError> {
    let table = parse_table(data, file_name)?;
    let columns = detect_columns(&table.headers)?;

    let mut rows = Vec::new();
    let mut error_messages = Vec::new();
    for (index, row) in table.rows.iter().enumerate() {
        let row_num = index + 2;
        match assemble_row(row, row_num, &columns) {
            RowParse::Skip => {}
            RowParse::Error(message) => error_messages.push(message),
            RowParse::Row(assembled) => {
                let pending_address = if assembled.direct_location.is_none() {
                    assembled.address.clone()
                } else {
                    None
                };
                rows.push(PreviewRow {
                    row_num,
                    draft: EntryDraft {
                        shop_name: assembled.shop_name,
                        location: assembled.direct_location,
                        website: assembled.website,
                        phone: assembled.phone,
                    },
                    pending_address,
                });
            }
        }
    }

    Ok(Preview { rows, error_messages })
}
