//! Wire models for the CMS management API

use serde::Deserialize;

/// System metadata the CMS attaches to every entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySys {
    pub id: String,
    /// Version counter, required as a precondition header on every mutation.
    pub version: u32,
    /// Present only on published entries.
    pub published_version: Option<u32>,
}

/// An entry as returned by list/create calls. Field payloads are ignored;
/// only the system metadata is needed for delete and publish sequencing.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryStub {
    pub sys: EntrySys,
}

/// One page of a collection listing.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryPage {
    pub total: usize,
    pub items: Vec<EntryStub>,
}
