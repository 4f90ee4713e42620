//! Core types for the roster import pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point on the map, as stored on a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// In-memory draft of one directory entry, assembled from one roster row.
///
/// Optional fields are `None` when the column was not detected or the cell
/// was blank; they are never stored as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDraft {
    pub shop_name: String,
    pub location: Option<Coordinates>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

/// Accumulated outcome of one import run.
///
/// Messages keep source row order. The report is built fresh per invocation
/// and discarded after the caller renders it.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// One message per created row.
    pub success_messages: Vec<String>,
    /// One message per rejected or failed row, plus the delete-phase warning
    /// when replacing fails.
    pub error_messages: Vec<String>,
    /// Entries removed by a successful delete phase. `None` when appending
    /// or when the delete phase failed.
    pub deleted_count: Option<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the run was cancelled before all rows were processed.
    pub cancelled: bool,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.success_messages.len()
    }

    pub fn error_count(&self) -> usize {
        self.error_messages.len()
    }
}

/// Fatal pipeline error. Row-level conditions never surface here; they are
/// recorded in the report's message lists instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The upload parses as neither a workbook nor a delimited table.
    MalformedInput { file_name: String, reason: String },
    /// The header row has no column for a required field.
    MissingColumn { field: &'static str },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::MalformedInput { file_name, reason } => {
                write!(f, "'{}' could not be read as a roster table: {}", file_name, reason)
            }
            ImportError::MissingColumn { field } => {
                write!(f, "no '{}' column found in the header row", field)
            }
        }
    }
}

impl std::error::Error for ImportError {}
