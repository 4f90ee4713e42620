//! Roster import pipeline
//!
//! This module turns an uploaded roster file (XLSX or delimited text) into
//! directory-entry create operations against the CMS, tolerating row-level
//! failure without aborting the batch.

pub mod columns;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod types;

pub use pipeline::{CancelFlag, ImportOptions, Preview, PreviewRow, preview_rows, run_import};
pub use types::{Coordinates, EntryDraft, ImportError, ImportReport};
