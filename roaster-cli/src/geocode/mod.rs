//! Forward geocoding of street addresses
//!
//! The import pipeline only needs "address in, maybe coordinates out". The
//! HTTP implementation targets a Mapbox-style forward geocoding endpoint;
//! [`CachedGeocoder`] keeps an explicit set of already-requested addresses
//! so repeated rows never hit the provider twice.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use log::warn;
use serde::Deserialize;

use crate::api::client::send_json;
use crate::api::resilience::{RetryConfig, with_retry};
use crate::config::GeocodeConfig;
use crate::import::types::Coordinates;

/// Seam between the import pipeline and the mapping provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text address to coordinates.
    ///
    /// Returns `None` both for "address not found" and for transport
    /// failures. A geocoding miss must never abort an import row, so this
    /// never raises.
    async fn geocode(&self, address: &str) -> Option<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    /// `[longitude, latitude]`
    center: Vec<f64>,
}

/// Mapbox-style forward geocoding client.
pub struct HttpGeocoder {
    http: reqwest::Client,
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl HttpGeocoder {
    pub fn new(config: &GeocodeConfig, token: String, retry: RetryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            retry,
        }
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            self.base_url,
            urlencoding::encode(address)
        );

        let result: anyhow::Result<GeocodeResponse> =
            with_retry(&self.retry, "forward geocode", || {
                let req = self
                    .http
                    .get(url.as_str())
                    .query(&[("access_token", self.token.as_str()), ("limit", "1")]);
                async move { send_json(req).await }
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!("geocoding '{}' failed: {:#}", address, err);
                return None;
            }
        };

        let feature = response.features.into_iter().next()?;
        match feature.center.as_slice() {
            [longitude, latitude, ..] => Some(Coordinates {
                latitude: *latitude,
                longitude: *longitude,
            }),
            _ => None,
        }
    }
}

/// Request de-duplication cache around any [`Geocoder`].
///
/// Each distinct address is sent to the inner geocoder at most once per
/// cache lifetime; negative results are cached too. The cache is owned by
/// the wrapper and lives as long as one import invocation.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<String, Option<Coordinates>>>,
}

impl<G> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        if let Some(cached) = self.cache.lock().unwrap().get(address) {
            return *cached;
        }
        // Lock released before awaiting; the sequential pipeline never
        // issues overlapping lookups for the same address.
        let result = self.inner.geocode(address).await;
        self.cache.lock().unwrap().insert(address.to_string(), result);
        result
    }
}

/// Used when no geocoding credentials are configured; every lookup misses
/// and the affected rows import without a location.
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn geocode(&self, _address: &str) -> Option<Coordinates> {
        None
    }
}
