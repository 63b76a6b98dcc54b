//! Address and zipcode geocoding
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::AppConfig;
use crate::error::ErrorResponse;
use crate::models::GeoLocation;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Geocoding provider error: {0}")]
    Provider(String),

    #[error("Unsupported geocoding provider: {0}")]
    UnsupportedProvider(String),
}

impl From<GeocodeError> for ErrorResponse {
    fn from(err: GeocodeError) -> Self {
        log::error!("Geocoding failed: {}", err);
        ErrorResponse::internal("Geocoding service unavailable")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub street: String,
    pub city: String,
    pub state_code: String,
    pub zipcode: String,
    pub country_code: String,
}

impl GeocodeResult {
    pub fn into_location(self) -> GeoLocation {
        GeoLocation {
            formatted_address: self.formatted_address,
            street: self.street,
            city: self.city,
            state: self.state_code,
            zipcode: self.zipcode,
            country: self.country_code,
            ..GeoLocation::point(self.longitude, self.latitude)
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidate locations for a free-form address or zipcode, best match first
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeocodeError>;
}

/// Geocode and take the best match, or 404 when nothing matched
pub async fn locate(geocoder: &dyn Geocoder, address: &str) -> Result<GeocodeResult, ErrorResponse> {
    geocoder
        .geocode(address)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ErrorResponse::not_found(format!("No location found for {}", address)))
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
    info: MapQuestInfo,
}

#[derive(Debug, Deserialize)]
struct MapQuestInfo {
    statuscode: i32,
    #[serde(default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    #[serde(default)]
    street: String,
    /// City
    #[serde(default)]
    admin_area5: String,
    /// State
    #[serde(default)]
    admin_area3: String,
    /// Country
    #[serde(default)]
    admin_area1: String,
    #[serde(default)]
    postal_code: String,
    lat_lng: MapQuestLatLng,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

impl From<MapQuestLocation> for GeocodeResult {
    fn from(loc: MapQuestLocation) -> Self {
        let formatted_address = format!(
            "{}, {}, {} {}, {}",
            loc.street, loc.admin_area5, loc.admin_area3, loc.postal_code, loc.admin_area1
        );
        GeocodeResult {
            latitude: loc.lat_lng.lat,
            longitude: loc.lat_lng.lng,
            formatted_address,
            street: loc.street,
            city: loc.admin_area5,
            state_code: loc.admin_area3,
            zipcode: loc.postal_code,
            country_code: loc.admin_area1,
        }
    }
}

/// MapQuest geocoding API client
pub struct MapQuestGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MapQuestGeocoder {
    pub fn new(base_url: String, api_key: String) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("devcamper/0.1.0")
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeResult>, GeocodeError> {
        let response: MapQuestResponse = self
            .client
            .get(format!("{}/geocoding/v1/address", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("location", address)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.info.statuscode != 0 {
            return Err(GeocodeError::Provider(response.info.messages.join("; ")));
        }

        Ok(response
            .results
            .into_iter()
            .flat_map(|r| r.locations)
            .map(GeocodeResult::from)
            .collect())
    }
}

/// Build the configured geocoder
pub fn geocoder_from_config(config: &AppConfig) -> Result<Arc<dyn Geocoder>, GeocodeError> {
    match config.geocoder_provider.as_str() {
        "mapquest" => Ok(Arc::new(MapQuestGeocoder::new(
            "https://www.mapquestapi.com".to_string(),
            config.geocoder_api_key.clone(),
        )?)),
        other => Err(GeocodeError::UnsupportedProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapquest_payload_parsing() {
        let raw = serde_json::json!({
            "info": { "statuscode": 0, "messages": [] },
            "results": [{
                "locations": [{
                    "street": "233 Bay State Rd",
                    "adminArea5": "Boston",
                    "adminArea3": "MA",
                    "adminArea1": "US",
                    "postalCode": "02215",
                    "latLng": { "lat": 42.350909, "lng": -71.105509 }
                }]
            }]
        });
        let response: MapQuestResponse = serde_json::from_value(raw).unwrap();
        let result: GeocodeResult = response
            .results
            .into_iter()
            .flat_map(|r| r.locations)
            .map(GeocodeResult::from)
            .next()
            .unwrap();

        assert_eq!(result.city, "Boston");
        assert_eq!(result.formatted_address, "233 Bay State Rd, Boston, MA 02215, US");

        let location = result.into_location();
        assert_eq!(location.kind, "Point");
        assert_eq!(location.coordinates, [-71.105509, 42.350909]);
        assert_eq!(location.zipcode, "02215");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = AppConfig {
            geocoder_provider: "nowhere".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            geocoder_from_config(&config),
            Err(GeocodeError::UnsupportedProvider(_))
        ));
    }
}
