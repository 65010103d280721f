use serde::{Deserialize, Serialize};

use crate::models::GeoPoint;

/// A place returned by the geocoder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceCandidate {
    /// Full human-readable label
    pub display_name: String,
    pub point: GeoPoint,
}

/// Outcome of a single place lookup. Failures are folded in here instead of being raised.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceLookup {
    /// At least one candidate, in provider relevance order
    Found(Vec<PlaceCandidate>),
    /// The provider answered but nothing matched
    Empty,
    /// Transport or payload failure, with a reason for the log
    Failed(String),
}

impl PlaceLookup {
    pub fn candidates(&self) -> &[PlaceCandidate] {
        match self {
            PlaceLookup::Found(candidates) => candidates,
            PlaceLookup::Empty | PlaceLookup::Failed(_) => &[],
        }
    }
}
