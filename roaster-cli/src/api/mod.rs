//! CMS management API client
//!
//! The directory collection lives in a headless CMS; this module owns the
//! HTTP client, the wire models, and the retry layer shared with the
//! geocoder.

pub mod client;
pub mod models;
pub mod resilience;

pub use client::{DirectoryClient, DirectoryStore};
pub use resilience::RetryConfig;
