use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MapSearchError, Result};
use crate::models::GeoPoint;

/// Settings for geocoding, device location and the radius search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Place-search endpoint (Nominatim compatible)
    pub geocoding_endpoint: String,
    /// ISO 3166-1 alpha-2 code results are restricted to
    pub country_code: String,
    /// Maximum number of place candidates returned per lookup
    pub result_limit: usize,
    pub user_agent: String,
    #[serde(with = "duration_secs")]
    pub http_timeout: Duration,
    /// How long a device location request may take before it counts as a timeout
    #[serde(with = "duration_secs")]
    pub location_timeout: Duration,
    pub default_radius_km: f64,
    /// Radius choices offered in the picker
    pub radius_options_km: Vec<f64>,
    /// Map center before anything is selected
    pub default_center: GeoPoint,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            geocoding_endpoint: "https://nominatim.openstreetmap.org/search".to_string(),
            country_code: "in".to_string(),
            result_limit: 5,
            user_agent: concat!("estate-map-search/", env!("CARGO_PKG_VERSION")).to_string(),
            http_timeout: Duration::from_secs(15),
            location_timeout: Duration::from_secs(10),
            default_radius_km: 10.0,
            radius_options_km: vec![5.0, 10.0, 25.0, 50.0, 100.0],
            default_center: GeoPoint {
                latitude: 19.0760,
                longitude: 72.8777,
            },
        }
    }
}

impl SearchConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: SearchConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `ESTATE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = SearchConfigBuilder { config: self };

        if let Some(url) = lookup("ESTATE_GEOCODER_URL") {
            debug!("Geocoder endpoint overridden: {}", url);
            builder = builder.geocoding_endpoint(url);
        }
        if let Some(code) = lookup("ESTATE_COUNTRY_CODE") {
            builder = builder.country_code(code);
        }
        if let Some(limit) = lookup("ESTATE_RESULT_LIMIT") {
            let limit = limit.trim().parse::<usize>().map_err(|e| {
                MapSearchError::Config(format!("ESTATE_RESULT_LIMIT: {}", e))
            })?;
            builder = builder.result_limit(limit);
        }
        if let Some(secs) = lookup("ESTATE_LOCATION_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                MapSearchError::Config(format!("ESTATE_LOCATION_TIMEOUT_SECS: {}", e))
            })?;
            builder = builder.location_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    fn validate(&self) -> Result<()> {
        if !(self.default_radius_km.is_finite() && self.default_radius_km > 0.0) {
            return Err(MapSearchError::Config(format!(
                "default radius must be positive, got {}",
                self.default_radius_km
            )));
        }
        if self.geocoding_endpoint.trim().is_empty() {
            return Err(MapSearchError::Config("geocoding endpoint is empty".to_string()));
        }
        if !(1..=50).contains(&self.result_limit) {
            return Err(MapSearchError::Config(format!(
                "result limit must be between 1 and 50, got {}",
                self.result_limit
            )));
        }
        GeoPoint::new(self.default_center.latitude, self.default_center.longitude)?;
        Ok(())
    }
}

/// Builder for [`SearchConfig`] starting from the defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geocoding_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.geocoding_endpoint = url.into();
        self
    }

    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.config.country_code = code.into().trim().to_lowercase();
        self
    }

    /// Clamped to 1..=50
    pub fn result_limit(mut self, limit: usize) -> Self {
        self.config.result_limit = limit.clamp(1, 50);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn location_timeout(mut self, timeout: Duration) -> Self {
        self.config.location_timeout = timeout;
        self
    }

    pub fn default_radius_km(mut self, km: f64) -> Self {
        self.config.default_radius_km = km;
        self
    }

    pub fn radius_options_km(mut self, options: Vec<f64>) -> Self {
        self.config.radius_options_km = options;
        self
    }

    pub fn default_center(mut self, center: GeoPoint) -> Self {
        self.config.default_center = center;
        self
    }

    pub fn build(self) -> Result<SearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
