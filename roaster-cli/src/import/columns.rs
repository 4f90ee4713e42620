//! Heuristic header detection for roster tables
//!
//! Rosters arrive from many sources with no agreed column names, so fields
//! are located by keyword matching against the header row. Each field has an
//! explicit keyword set; the first header containing any of its keywords
//! wins and later matches are ignored. A header can satisfy more than one
//! field (a "Shop Location" header matches both the shop-name and address
//! keyword sets) and that is accepted as-is.

use super::types::ImportError;

const SHOP_NAME_KEYWORDS: &[&str] = &["name", "shop"];
const ADDRESS_KEYWORDS: &[&str] = &["address", "location"];
const LATITUDE_KEYWORDS: &[&str] = &["lat", "latitude"];
const LONGITUDE_KEYWORDS: &[&str] = &["lon", "lng", "longitude"];
const WEBSITE_KEYWORDS: &[&str] = &["website", "url", "web"];
const PHONE_KEYWORDS: &[&str] = &["phone", "tel"];

/// Column indices resolved once per import from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub shop_name: usize,
    pub address: Option<usize>,
    pub latitude: Option<usize>,
    pub longitude: Option<usize>,
    pub website: Option<usize>,
    pub phone: Option<usize>,
}

/// Resolve column indices from the header row.
///
/// Headers are lower-cased and trimmed before matching. Only the shop-name
/// column is required; its absence fails the whole file.
pub fn detect_columns(headers: &[String]) -> Result<ColumnMap, ImportError> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let shop_name = find_column(&normalized, SHOP_NAME_KEYWORDS)
        .ok_or(ImportError::MissingColumn { field: "shop name" })?;

    Ok(ColumnMap {
        shop_name,
        address: find_column(&normalized, ADDRESS_KEYWORDS),
        latitude: find_column(&normalized, LATITUDE_KEYWORDS),
        longitude: find_column(&normalized, LONGITUDE_KEYWORDS),
        website: find_column(&normalized, WEBSITE_KEYWORDS),
        phone: find_column(&normalized, PHONE_KEYWORDS),
    })
}

/// First header containing any keyword wins.
fn find_column(normalized_headers: &[String], keywords: &[&str]) -> Option<usize> {
    normalized_headers
        .iter()
        .position(|header| keywords.iter().any(|keyword| header.contains(keyword)))
}
