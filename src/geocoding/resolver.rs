use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{MapSearchError, Result};
use crate::geocoding::traits::Geocoder;
use crate::geocoding::types::PlaceLookup;

/// Trim a place query, rejecting blank input before any lookup is attempted
pub fn validate_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        Err(MapSearchError::EmptyQuery)
    } else {
        Ok(query)
    }
}

/// Resolves free text to place candidates. Lookup failures never escape: they come back as
/// [`PlaceLookup::Failed`]. One attempt per call, no retries.
#[derive(Clone)]
pub struct PlaceResolver {
    geocoder: Arc<dyn Geocoder>,
    limit: usize,
}

impl PlaceResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, limit: usize) -> Self {
        Self { geocoder, limit }
    }

    /// Only an empty query is an error; everything else is a [`PlaceLookup`]
    pub async fn resolve(&self, query: &str) -> Result<PlaceLookup> {
        let query = validate_query(query)?;
        Ok(self.resolve_validated(query).await)
    }

    pub(crate) async fn resolve_validated(&self, query: &str) -> PlaceLookup {
        match self.geocoder.lookup(query).await {
            Ok(mut candidates) if !candidates.is_empty() => {
                candidates.truncate(self.limit);
                info!(
                    query,
                    count = candidates.len(),
                    provider = self.geocoder.provider_name(),
                    "place lookup resolved"
                );
                PlaceLookup::Found(candidates)
            }
            Ok(_) => {
                info!(query, "place lookup returned no results");
                PlaceLookup::Empty
            }
            Err(e) => {
                warn!(query, error = %format!("{:#}", e), "place lookup failed");
                PlaceLookup::Failed(format!("{:#}", e))
            }
        }
    }
}
