use crate::geocoding::types::PlaceCandidate;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for place-search providers
/// Any service that turns free text into ranked coordinates can sit behind it
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up candidates for an already trimmed, non-empty query
    async fn lookup(&self, query: &str) -> Result<Vec<PlaceCandidate>>;

    /// Get the name of the provider
    fn provider_name(&self) -> &'static str;
}
