use serde::{Deserialize, Serialize};

use crate::error::{MapSearchError, Result};

/// Listing status shown on the property card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    #[serde(rename = "For Sale")]
    ForSale,
    #[serde(rename = "For Rent")]
    ForRent,
    #[serde(rename = "Sold")]
    Sold,
}

/// A listed property. Read-only once the catalog is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Display price, e.g. "₹2.5 Cr"
    pub price: String,
    pub beds: u32,
    pub baths: u32,
    pub sqft: u32,
    pub address: String,
    pub city: String,
    pub status: ListingStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub year_built: Option<u16>,
    #[serde(default)]
    pub parking: Option<u8>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Property {
    pub fn coordinates(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting latitudes outside [-90, 90] and longitudes outside [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(MapSearchError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Search radius in kilometres, always positive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(try_from = "f64", into = "f64")]
pub struct RadiusKm(f64);

impl RadiusKm {
    pub fn new(km: f64) -> Result<Self> {
        if km.is_finite() && km > 0.0 {
            Ok(Self(km))
        } else {
            Err(MapSearchError::InvalidRadius(km))
        }
    }

    pub fn km(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RadiusKm {
    type Error = MapSearchError;

    fn try_from(km: f64) -> Result<Self> {
        Self::new(km)
    }
}

impl From<RadiusKm> for f64 {
    fn from(radius: RadiusKm) -> Self {
        radius.0
    }
}

/// The point and radius currently driving the radius filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SearchSelection {
    pub point: GeoPoint,
    pub radius_km: RadiusKm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_bounds() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_radius_must_be_positive() {
        assert!(RadiusKm::new(0.5).is_ok());
        assert!(matches!(
            RadiusKm::new(0.0),
            Err(MapSearchError::InvalidRadius(_))
        ));
        assert!(RadiusKm::new(-3.0).is_err());
        assert!(RadiusKm::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_property_deserializes_with_defaults() {
        let json = r#"{
            "id": 4,
            "latitude": 18.5204,
            "longitude": 73.8567,
            "price": "₹85 L",
            "beds": 2,
            "baths": 2,
            "sqft": 1100,
            "address": "Koregaon Park",
            "city": "Pune",
            "status": "For Rent"
        }"#;
        let property: Property = serde_json::from_str(json).unwrap();
        assert_eq!(property.status, ListingStatus::ForRent);
        assert!(!property.featured);
        assert!(property.images.is_empty());
        assert!(property.property_type.is_none());
        assert_eq!(property.coordinates().latitude, 18.5204);
    }
}
