use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{MapSearchError, Result};
use crate::geo;
use crate::models::{GeoPoint, Property};

static EMBEDDED_PROPERTIES: &str = include_str!("../../data/properties.json");

static GLOBAL_CATALOG: Lazy<Catalog> = Lazy::new(|| match Catalog::from_json(EMBEDDED_PROPERTIES) {
    Ok(catalog) => {
        info!("Loaded embedded catalog with {} properties", catalog.len());
        catalog
    }
    Err(e) => {
        warn!("Embedded catalog is invalid, falling back to an empty catalog: {}", e);
        Catalog::default()
    }
});

/// Read-only set of listings. Cloning shares the underlying storage.
#[derive(Debug, Clone)]
pub struct Catalog {
    properties: Arc<[Property]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            properties: Arc::from(Vec::new()),
        }
    }
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and out-of-range coordinates
    pub fn from_properties(properties: Vec<Property>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(properties.len());
        for property in &properties {
            if !seen.insert(property.id) {
                return Err(MapSearchError::Catalog(format!(
                    "duplicate property id {}",
                    property.id
                )));
            }
            GeoPoint::new(property.latitude, property.longitude).map_err(|e| {
                MapSearchError::Catalog(format!("property {}: {}", property.id, e))
            })?;
        }

        Ok(Self {
            properties: properties.into(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let properties: Vec<Property> = serde_json::from_str(json)?;
        Self::from_properties(properties)
    }

    /// Load a catalog from a JSON file containing an array of properties
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading catalog from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Process-wide catalog backed by the bundled dataset, loaded on first use
    pub fn global() -> &'static Catalog {
        &GLOBAL_CATALOG
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    pub fn featured(&self) -> Vec<&Property> {
        self.properties.iter().filter(|p| p.featured).collect()
    }

    /// Distinct city names in first-seen order
    pub fn cities(&self) -> Vec<&str> {
        let mut cities: Vec<&str> = Vec::new();
        for property in self.properties.iter() {
            if !cities.contains(&property.city.as_str()) {
                cities.push(&property.city);
            }
        }
        cities
    }

    pub fn within_radius(&self, center: GeoPoint, radius_km: f64) -> Vec<&Property> {
        geo::within_radius(&self.properties, center, radius_km)
    }

    /// Listing page filter
    pub fn query(&self, query: &ListingQuery) -> Vec<&Property> {
        if let Some(ids) = &query.ids {
            return self
                .properties
                .iter()
                .filter(|p| ids.contains(&p.id))
                .collect();
        }

        let term = query.search_term.trim().to_lowercase();
        let city = query.city.as_deref().map(normalize_city);

        self.properties
            .iter()
            .filter(|p| {
                term.is_empty()
                    || p.address.to_lowercase().contains(&term)
                    || p.description.to_lowercase().contains(&term)
                    || p.city.to_lowercase().contains(&term)
            })
            .filter(|p| city.as_deref().map_or(true, |c| p.city == c))
            .collect()
    }
}

/// Criteria for the property listing page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingQuery {
    /// Free text matched against address, description and city
    #[serde(default)]
    pub search_term: String,
    /// `None` means all cities
    #[serde(default)]
    pub city: Option<String>,
    /// When set, exactly these listings are returned and the other criteria are ignored
    #[serde(default)]
    pub ids: Option<Vec<u32>>,
}

impl ListingQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..Self::default()
        }
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        let city = city.into();
        self.city = if city.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(city)
        };
        self
    }

    /// Parse a comma-separated id list such as `"3,7,12"`.
    /// Entries that are not numbers are skipped; a blank parameter leaves the id filter unset.
    pub fn from_ids_param(param: &str) -> Self {
        if param.trim().is_empty() {
            return Self::default();
        }
        let ids = param
            .split(',')
            .filter_map(|part| part.trim().parse::<u32>().ok())
            .collect();
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }
}

/// "mUMBAI" -> "Mumbai"
fn normalize_city(city: &str) -> String {
    let city = city.trim();
    let mut chars = city.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
