//! HTTP client for the directory collection in the headless CMS
//!
//! Talks to a Contentful-style management API: entries live in a space and
//! environment, mutations carry the entry version as a precondition header,
//! and a created entry must be published before the site serves it.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::api::models::{EntryPage, EntryStub};
use crate::api::resilience::{RetryConfig, with_retry};
use crate::config::CmsConfig;
use crate::import::types::EntryDraft;

const VERSION_HEADER: &str = "X-Contentful-Version";
const CONTENT_TYPE_HEADER: &str = "X-Contentful-Content-Type";
const PAGE_SIZE: &str = "100";

/// Seam between the import pipeline and the CMS.
///
/// The pipeline only ever needs these two operations; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Delete every entry in the directory collection. Returns the count of
    /// deleted entries.
    async fn delete_all_entries(&self) -> Result<usize>;

    /// Create and publish one directory entry. Returns the new entry id.
    async fn create_entry(&self, draft: &EntryDraft) -> Result<String>;
}

/// Management-API client scoped to one space, environment and collection.
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    space: String,
    environment: String,
    collection: String,
    locale: String,
    token: String,
    retry: RetryConfig,
}

impl DirectoryClient {
    pub fn new(config: &CmsConfig, token: String, retry: RetryConfig) -> Result<Self> {
        if config.space.is_empty() {
            bail!("cms.space is not configured; set it in the config file");
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            space: config.space.clone(),
            environment: config.environment.clone(),
            collection: config.collection.clone(),
            locale: config.locale.clone(),
            token,
            retry,
        })
    }

    fn entries_url(&self) -> String {
        format!(
            "{}/spaces/{}/environments/{}/entries",
            self.base_url, self.space, self.environment
        )
    }

    async fn list_page(&self) -> Result<EntryPage> {
        with_retry(&self.retry, "list entries", || {
            let req = self
                .http
                .get(self.entries_url())
                .bearer_auth(&self.token)
                .query(&[("content_type", self.collection.as_str()), ("limit", PAGE_SIZE)]);
            async move { send_json(req).await }
        })
        .await
    }

    /// Published entries must be unpublished before deletion, and the
    /// unpublish bumps the version used by the final delete.
    async fn delete_entry(&self, entry: &EntryStub) -> Result<()> {
        let url = format!("{}/{}", self.entries_url(), entry.sys.id);
        let mut version = entry.sys.version;

        if entry.sys.published_version.is_some() {
            let unpublished: EntryStub = with_retry(&self.retry, "unpublish entry", || {
                let req = self
                    .http
                    .delete(format!("{}/published", url))
                    .bearer_auth(&self.token)
                    .header(VERSION_HEADER, version);
                async move { send_json(req).await }
            })
            .await?;
            version = unpublished.sys.version;
        }

        with_retry(&self.retry, "delete entry", || {
            let req = self
                .http
                .delete(url.as_str())
                .bearer_auth(&self.token)
                .header(VERSION_HEADER, version);
            async move { send_no_content(req).await }
        })
        .await
    }

    /// Entry payload with per-locale field values. Optional draft fields
    /// that are `None` are left out of the payload entirely.
    fn entry_payload(&self, draft: &EntryDraft) -> Value {
        let mut fields = Map::new();
        fields.insert("shopName".to_string(), self.localized(json!(draft.shop_name)));
        if let Some(location) = &draft.location {
            fields.insert(
                "location".to_string(),
                self.localized(json!({ "lat": location.latitude, "lon": location.longitude })),
            );
        }
        if let Some(website) = &draft.website {
            fields.insert("website".to_string(), self.localized(json!(website)));
        }
        if let Some(phone) = &draft.phone {
            fields.insert("phoneNumber".to_string(), self.localized(json!(phone)));
        }
        json!({ "fields": fields })
    }

    fn localized(&self, value: Value) -> Value {
        let mut localized = Map::new();
        localized.insert(self.locale.clone(), value);
        Value::Object(localized)
    }
}

#[async_trait]
impl DirectoryStore for DirectoryClient {
    async fn delete_all_entries(&self) -> Result<usize> {
        let mut deleted = 0;
        loop {
            let page = self
                .list_page()
                .await
                .context("Failed to list existing entries")?;
            if page.items.is_empty() {
                break;
            }
            debug!("deleting {} of {} remaining entries", page.items.len(), page.total);
            for entry in &page.items {
                self.delete_entry(entry)
                    .await
                    .with_context(|| format!("Failed to delete entry {}", entry.sys.id))?;
                deleted += 1;
            }
        }
        debug!("deleted {} entries from collection '{}'", deleted, self.collection);
        Ok(deleted)
    }

    async fn create_entry(&self, draft: &EntryDraft) -> Result<String> {
        let payload = self.entry_payload(draft);
        let created: EntryStub = with_retry(&self.retry, "create entry", || {
            let req = self
                .http
                .post(self.entries_url())
                .bearer_auth(&self.token)
                .header(CONTENT_TYPE_HEADER, &self.collection)
                .json(&payload);
            async move { send_json(req).await }
        })
        .await
        .with_context(|| format!("Failed to create entry for '{}'", draft.shop_name))?;

        // Entries are created as drafts; publish so the site picks them up.
        let publish_url = format!("{}/{}/published", self.entries_url(), created.sys.id);
        let _published: EntryStub = with_retry(&self.retry, "publish entry", || {
            let req = self
                .http
                .put(publish_url.as_str())
                .bearer_auth(&self.token)
                .header(VERSION_HEADER, created.sys.version);
            async move { send_json(req).await }
        })
        .await
        .with_context(|| format!("Failed to publish entry for '{}'", draft.shop_name))?;

        debug!("created entry {} for '{}'", created.sys.id, draft.shop_name);
        Ok(created.sys.id)
    }
}

/// Send a request and decode a JSON body, folding non-2xx statuses into the
/// error with the response body attached.
pub(crate) async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
    let resp = req.send().await.context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("API returned {}: {}", status, body.trim());
    }
    resp.json().await.context("Failed to decode API response")
}

/// Send a request where only the status matters.
pub(crate) async fn send_no_content(req: RequestBuilder) -> Result<()> {
    let resp = req.send().await.context("request failed")?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("API returned {}: {}", status, body.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::types::Coordinates;

    fn test_client() -> DirectoryClient {
        let config = CmsConfig {
            space: "space1".to_string(),
            ..CmsConfig::default()
        };
        DirectoryClient::new(&config, "token".to_string(), RetryConfig::default()).unwrap()
    }

    #[test]
    fn new_rejects_missing_space() {
        let config = CmsConfig::default();
        assert!(DirectoryClient::new(&config, "token".to_string(), RetryConfig::default()).is_err());
    }

    #[test]
    fn entries_url_is_scoped_to_space_and_environment() {
        let client = test_client();
        assert_eq!(
            client.entries_url(),
            "https://api.contentful.com/spaces/space1/environments/master/entries"
        );
    }

    #[test]
    fn payload_localizes_fields_and_omits_blank_optionals() {
        let client = test_client();
        let draft = EntryDraft {
            shop_name: "Bean There".to_string(),
            location: Some(Coordinates { latitude: 39.1, longitude: -89.6 }),
            website: Some("beanthere.com".to_string()),
            phone: None,
        };
        let payload = client.entry_payload(&draft);
        let fields = &payload["fields"];
        assert_eq!(fields["shopName"]["en-US"], "Bean There");
        assert_eq!(fields["location"]["en-US"]["lat"], 39.1);
        assert_eq!(fields["website"]["en-US"], "beanthere.com");
        assert!(fields.get("phoneNumber").is_none());
    }
}
