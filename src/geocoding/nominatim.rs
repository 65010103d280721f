use crate::config::SearchConfig;
use crate::geocoding::traits::Geocoder;
use crate::geocoding::types::PlaceCandidate;
use crate::models::GeoPoint;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Raw entry of a Nominatim search response. Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim place search
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    country_code: String,
    limit: usize,
}

impl NominatimGeocoder {
    /// Create a geocoder with the default configuration (India, five results)
    pub fn new() -> Result<Self> {
        Self::with_config(&SearchConfig::default())
    }

    /// Create a geocoder from custom search settings
    pub fn with_config(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.geocoding_endpoint.clone(),
            country_code: config.country_code.clone(),
            limit: config.result_limit,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>> {
        debug!("Geocoding {:?} via {}", query, self.endpoint);

        let limit = self.limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "json"),
                ("q", query),
                ("countrycodes", self.country_code.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach geocoding service")?;

        if !response.status().is_success() {
            warn!("Geocoder returned status: {}", response.status());
            anyhow::bail!("Geocoding request failed: {}", response.status());
        }

        let body = response.text().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes of geocoding results", body.len());

        let mut candidates = parse_candidates(&body)?;
        candidates.truncate(self.limit);
        Ok(candidates)
    }

    fn provider_name(&self) -> &'static str {
        "Nominatim"
    }
}

/// Parse a Nominatim JSON array.
/// Any entry with unusable coordinates makes the whole payload malformed.
pub fn parse_candidates(body: &str) -> Result<Vec<PlaceCandidate>> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).context("Malformed geocoding payload")?;

    places
        .into_iter()
        .map(|place| -> Result<PlaceCandidate> {
            let latitude: f64 = place
                .lat
                .trim()
                .parse()
                .with_context(|| {
                    format!("Bad latitude {:?} for {}", place.lat, place.display_name)
                })?;
            let longitude: f64 = place
                .lon
                .trim()
                .parse()
                .with_context(|| {
                    format!("Bad longitude {:?} for {}", place.lon, place.display_name)
                })?;
            let point = GeoPoint::new(latitude, longitude)?;

            Ok(PlaceCandidate {
                display_name: place.display_name,
                point,
            })
        })
        .collect()
}
