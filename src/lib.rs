//! Radius search over a property catalog: haversine filtering, place lookup and a
//! map search controller that reconciles clicks, device location and text search.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod controller;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod location;
pub mod models;

pub use catalog::{Catalog, ListingQuery};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use controller::{MapSearchController, MapSearchSession, MapSearchSnapshot, Status};
pub use error::{MapSearchError, Result};
pub use geocoding::{Geocoder, NominatimGeocoder, PlaceCandidate, PlaceLookup, PlaceResolver};
pub use location::{DeviceLocator, FixedLocator, LocationError};
pub use models::{GeoPoint, Property, RadiusKm, SearchSelection};
