use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::GeoPoint;

/// Why the device could not report a position
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationError {
    #[error("Location access was denied")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Source of the user's current position (browser geolocation, GPS, IP lookup, ...)
#[async_trait]
pub trait DeviceLocator: Send + Sync {
    async fn current_position(&self) -> Result<GeoPoint, LocationError>;
}

/// Ask `locator` for a position, giving up with [`LocationError::Timeout`] after `limit`
pub async fn locate_with_timeout(
    locator: &dyn DeviceLocator,
    limit: Duration,
) -> Result<GeoPoint, LocationError> {
    match tokio::time::timeout(limit, locator.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Device location did not answer within {:?}", limit);
            Err(LocationError::Timeout)
        }
    }
}

/// Locator for hosts without a location API: always answers with the same fix, or the same failure
#[derive(Debug, Clone)]
pub struct FixedLocator {
    answer: Result<GeoPoint, LocationError>,
}

impl FixedLocator {
    pub fn at(point: GeoPoint) -> Self {
        Self { answer: Ok(point) }
    }

    pub fn failing(error: LocationError) -> Self {
        Self { answer: Err(error) }
    }

    /// A locator with no position source at all
    pub fn unavailable() -> Self {
        Self::failing(LocationError::PositionUnavailable)
    }
}

#[async_trait]
impl DeviceLocator for FixedLocator {
    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        self.answer
    }
}
