//! Read roster files into a uniform in-memory table
//!
//! The upload is a raw byte buffer; the format is sniffed from the content
//! (XLSX workbooks start with the ZIP magic), never from the filename. The
//! filename is carried along for diagnostics only.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::ImportError;

/// XLSX files are ZIP archives.
const ZIP_MAGIC: &[u8] = b"PK";

/// UTF-8 BOM bytes, stripped before delimited parsing.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Sheet names that look like the roster sheet. Workbooks exported from
/// shared templates often carry notes or stats sheets alongside the data.
static ROSTER_SHEET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)roster|shops|directory").unwrap());

/// A parsed roster table: one header row plus zero or more data rows.
///
/// Row numbers in messages are 1-based with the header as row 1, so data
/// row `i` is row `i + 2`.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse a roster buffer into a [`Table`].
///
/// ZIP magic selects the XLSX reader, anything else is treated as delimited
/// text. Returns [`ImportError::MalformedInput`] when neither applies.
pub fn parse_table(data: &[u8], file_name: &str) -> Result<Table, ImportError> {
    if data.is_empty() {
        return Err(malformed(file_name, "file is empty"));
    }
    if data.starts_with(ZIP_MAGIC) {
        parse_xlsx(data, file_name)
    } else {
        parse_delimited(data, file_name)
    }
}

fn malformed(file_name: &str, reason: &str) -> ImportError {
    ImportError::MalformedInput {
        file_name: file_name.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_xlsx(data: &[u8], file_name: &str) -> Result<Table, ImportError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| malformed(file_name, &format!("invalid workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet = sheet_names
        .iter()
        .find(|name| ROSTER_SHEET.is_match(name))
        .or_else(|| sheet_names.first())
        .cloned()
        .ok_or_else(|| malformed(file_name, "workbook has no sheets"))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| malformed(file_name, &format!("failed to read sheet '{}': {}", sheet, e)))?;

    let mut rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    if rows.is_empty() {
        return Err(malformed(file_name, &format!("sheet '{}' has no rows", sheet)));
    }

    let headers = rows.remove(0);
    Ok(Table { headers, rows })
}

fn parse_delimited(data: &[u8], file_name: &str) -> Result<Table, ImportError> {
    let data = strip_utf8_bom(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| malformed(file_name, &format!("invalid delimited data: {}", e)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(malformed(file_name, "no rows found"));
    }

    let headers = rows.remove(0);
    Ok(Table { headers, rows })
}

fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(UTF8_BOM) {
        &data[UTF8_BOM.len()..]
    } else {
        data
    }
}

/// Normalize a workbook cell to the string form the pipeline works with.
/// Whole-number floats lose the trailing ".0" so numeric cells survive the
/// round-trip through string parsing.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delimited_text() {
        let data = b"Shop Name,Address\nBean There,123 Main St\n";
        let table = parse_table(data, "roster.csv").unwrap();
        assert_eq!(table.headers, ["Shop Name", "Address"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], ["Bean There", "123 Main St"]);
    }

    #[test]
    fn strips_utf8_bom_before_delimited_parsing() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"Name\nBean There\n");
        let table = parse_table(&data, "roster.csv").unwrap();
        assert_eq!(table.headers, ["Name"]);
    }

    #[test]
    fn empty_buffer_is_malformed() {
        let err = parse_table(b"", "empty.csv").unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput { .. }));
    }

    #[test]
    fn parses_workbook_bytes_and_prefers_roster_sheet() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(0, 0, "irrelevant").unwrap();

        let roster = workbook.add_worksheet();
        roster.set_name("Roster 2026").unwrap();
        roster.write_string(0, 0, "Shop Name").unwrap();
        roster.write_string(0, 1, "Lat").unwrap();
        roster.write_string(0, 2, "Lon").unwrap();
        roster.write_string(1, 0, "Bean There").unwrap();
        roster.write_number(1, 1, 39.1).unwrap();
        roster.write_number(1, 2, -89.0).unwrap();

        let bytes = workbook.save_to_buffer().unwrap();
        let table = parse_table(&bytes, "roster.xlsx").unwrap();
        assert_eq!(table.headers, ["Shop Name", "Lat", "Lon"]);
        assert_eq!(table.rows[0], ["Bean There", "39.1", "-89"]);
    }

    #[test]
    fn garbage_zip_is_malformed() {
        let err = parse_table(b"PK\x03\x04not really a workbook", "roster.xlsx").unwrap_err();
        assert!(matches!(err, ImportError::MalformedInput { .. }));
    }
}
