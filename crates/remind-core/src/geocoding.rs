//! Address lookup used when a location-bearing reminder is created or moved.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::models::GeoPoint;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "remind/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub point: GeoPoint,
    pub display_name: String,
}

/// Address to coordinates, and back.
///
/// Any failure (transport, non-success status, no match) is reported as
/// `CoreError::Upstream`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, CoreError>;

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, CoreError>;
}

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    display_name: Option<String>,
    error: Option<String>,
}

/// Geocoder backed by a Nominatim-compatible HTTP service.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Upstream(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CoreError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %url, "geocoding request failed");
                CoreError::Upstream(format!("geocoding request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, url = %url, "geocoding service returned an error");
            return Err(CoreError::Upstream(format!(
                "geocoding service returned {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CoreError::Upstream(format!("invalid geocoding response: {}", e)))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, CoreError> {
        let query = [
            ("q", address.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        let hits: Vec<SearchHit> = self.get("search", &query).await?;
        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Upstream(format!("address not found: {}", address)))?;

        let lat = hit.lat.parse::<f64>();
        let lng = hit.lon.parse::<f64>();
        match (lat, lng) {
            (Ok(lat), Ok(lng)) => {
                debug!(address, lat, lng, "address geocoded");
                Ok(GeocodedAddress {
                    point: GeoPoint { lat, lng },
                    display_name: hit.display_name,
                })
            }
            _ => Err(CoreError::Upstream(format!(
                "invalid coordinates for address: {}",
                address
            ))),
        }
    }

    async fn reverse_geocode(&self, point: GeoPoint) -> Result<String, CoreError> {
        let query = [
            ("lat", point.lat.to_string()),
            ("lon", point.lng.to_string()),
            ("format", "json".to_string()),
        ];
        let hit: ReverseHit = self.get("reverse", &query).await?;
        match (hit.display_name, hit.error) {
            (Some(name), _) => Ok(name),
            (None, Some(error)) => Err(CoreError::Upstream(error)),
            (None, None) => Err(CoreError::Upstream("no address at this position".to_string())),
        }
    }
}
