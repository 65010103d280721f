pub mod session;

pub use session::MapSearchSession;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::SearchConfig;
use crate::error::{MapSearchError, Result};
use crate::geocoding::resolver::validate_query;
use crate::geocoding::types::{PlaceCandidate, PlaceLookup};
use crate::location::LocationError;
use crate::models::{GeoPoint, Property, RadiusKm, SearchSelection};

/// Where the map search currently is
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub enum Status {
    /// No point selected
    #[default]
    Idle,
    /// Device location request in flight
    Locating,
    /// Place lookup in flight, or its candidates are waiting for a pick
    Searching,
    /// Point set, results computed for the current radius
    Located,
}

/// Problem reported to the user after the controller fell back to [`Status::Idle`]
#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum SearchIssue {
    #[error("No places matched your search")]
    NoResults,
    #[error("Search failed, please try again")]
    SearchFailed {
        #[serde(skip)]
        reason: String,
    },
    #[error("{0}")]
    Location(LocationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Location,
    PlaceSearch,
}

/// Identifies one asynchronous request; only the most recently issued one may complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub seq: u64,
    pub kind: RequestKind,
}

/// What a completion did to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// A newer request or interaction superseded this one; nothing changed
    Stale,
}

/// Everything a page needs to render the map search
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapSearchSnapshot {
    pub status: Status,
    pub selection: Option<SearchSelection>,
    /// Current radius, also when no point is selected
    pub radius_km: RadiusKm,
    pub results: Vec<Property>,
    pub candidates: Vec<PlaceCandidate>,
    pub last_error: Option<SearchIssue>,
}

impl MapSearchSnapshot {
    /// User-facing status line
    pub fn message(&self) -> String {
        if let Some(issue) = &self.last_error {
            return issue.to_string();
        }
        match (self.status, self.selection) {
            (Status::Locating, _) => "Finding your location...".to_string(),
            (Status::Searching, _) if !self.candidates.is_empty() => {
                format!("{} places found, pick one", self.candidates.len())
            }
            (Status::Searching, _) => "Searching...".to_string(),
            (Status::Located, Some(selection)) => format!(
                "{} properties within {} km",
                self.results.len(),
                selection.radius_km.km()
            ),
            _ => "Select a location on the map to search".to_string(),
        }
    }

    /// Comma-separated result ids, the form the listing page accepts
    pub fn result_ids_param(&self) -> String {
        self.results
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Single owner of the map search state.
///
/// Map clicks, device location and place search all funnel into one selected point.
/// Asynchronous work is represented by [`RequestTicket`]s; completions whose ticket is
/// not the latest are dropped.
#[derive(Debug)]
pub struct MapSearchController {
    catalog: Catalog,
    status: Status,
    point: Option<GeoPoint>,
    radius: RadiusKm,
    results: Vec<Property>,
    candidates: Vec<PlaceCandidate>,
    last_error: Option<SearchIssue>,
    latest_seq: u64,
}

impl MapSearchController {
    pub fn new(catalog: Catalog, radius: RadiusKm) -> Self {
        Self {
            catalog,
            status: Status::Idle,
            point: None,
            radius,
            results: Vec::new(),
            candidates: Vec::new(),
            last_error: None,
            latest_seq: 0,
        }
    }

    pub fn with_config(catalog: Catalog, config: &SearchConfig) -> Result<Self> {
        Ok(Self::new(catalog, RadiusKm::new(config.default_radius_km)?))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn radius(&self) -> RadiusKm {
        self.radius
    }

    pub fn selection(&self) -> Option<SearchSelection> {
        match self.status {
            Status::Located => self.point.map(|point| SearchSelection {
                point,
                radius_km: self.radius,
            }),
            _ => None,
        }
    }

    pub fn results(&self) -> &[Property] {
        &self.results
    }

    pub fn candidates(&self) -> &[PlaceCandidate] {
        &self.candidates
    }

    pub fn last_error(&self) -> Option<&SearchIssue> {
        self.last_error.as_ref()
    }

    pub fn snapshot(&self) -> MapSearchSnapshot {
        MapSearchSnapshot {
            status: self.status,
            selection: self.selection(),
            radius_km: self.radius,
            results: self.results.clone(),
            candidates: self.candidates.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// A map click wins immediately and invalidates anything in flight
    pub fn click_map(&mut self, point: GeoPoint) {
        self.invalidate_pending();
        debug!(lat = point.latitude, lon = point.longitude, "map clicked");
        self.locate_at(point);
    }

    pub fn begin_locate(&mut self) -> RequestTicket {
        let ticket = self.issue(RequestKind::Location);
        self.status = Status::Locating;
        self.candidates.clear();
        self.last_error = None;
        debug!(seq = ticket.seq, "device location requested");
        ticket
    }

    pub fn finish_locate(
        &mut self,
        ticket: RequestTicket,
        outcome: std::result::Result<GeoPoint, LocationError>,
    ) -> Transition {
        if !self.is_current(ticket, RequestKind::Location) {
            debug!(seq = ticket.seq, latest = self.latest_seq, "discarding stale location fix");
            return Transition::Stale;
        }

        match outcome {
            Ok(point) => self.locate_at(point),
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, "device location failed");
                self.reset_with(Some(SearchIssue::Location(e)));
            }
        }
        Transition::Applied
    }

    /// Start a place search. A blank query is rejected and leaves the state untouched.
    pub fn begin_search(&mut self, query: &str) -> Result<RequestTicket> {
        let query = validate_query(query)?;
        let ticket = self.issue(RequestKind::PlaceSearch);
        self.status = Status::Searching;
        self.candidates.clear();
        self.last_error = None;
        debug!(seq = ticket.seq, query, "place search started");
        Ok(ticket)
    }

    pub fn finish_search(&mut self, ticket: RequestTicket, lookup: PlaceLookup) -> Transition {
        if !self.is_current(ticket, RequestKind::PlaceSearch) {
            debug!(seq = ticket.seq, latest = self.latest_seq, "discarding stale place results");
            return Transition::Stale;
        }

        match lookup {
            PlaceLookup::Found(candidates) if !candidates.is_empty() => {
                info!(seq = ticket.seq, count = candidates.len(), "place candidates ready");
                self.candidates = candidates;
            }
            PlaceLookup::Found(_) | PlaceLookup::Empty => {
                self.reset_with(Some(SearchIssue::NoResults))
            }
            PlaceLookup::Failed(reason) => {
                self.reset_with(Some(SearchIssue::SearchFailed { reason }))
            }
        }
        Transition::Applied
    }

    /// Pick one of the candidates from the last place search
    pub fn select_candidate(&mut self, index: usize) -> Result<()> {
        if self.status != Status::Searching {
            return Err(MapSearchError::UnknownCandidate(index));
        }
        let candidate = self
            .candidates
            .get(index)
            .cloned()
            .ok_or(MapSearchError::UnknownCandidate(index))?;

        info!(place = %candidate.display_name, "place selected");
        self.locate_at(candidate.point);
        Ok(())
    }

    /// Change the radius; when a point is selected the results are recomputed for it
    pub fn set_radius(&mut self, radius: RadiusKm) {
        self.radius = radius;
        if self.status == Status::Located {
            self.refresh_results();
        }
    }

    /// Back to idle from any state, dropping the point and anything in flight
    pub fn clear(&mut self) {
        self.invalidate_pending();
        self.reset_with(None);
    }

    fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        self.latest_seq += 1;
        RequestTicket {
            seq: self.latest_seq,
            kind,
        }
    }

    fn invalidate_pending(&mut self) {
        self.latest_seq += 1;
    }

    fn is_current(&self, ticket: RequestTicket, kind: RequestKind) -> bool {
        let expected_status = match kind {
            RequestKind::Location => Status::Locating,
            RequestKind::PlaceSearch => Status::Searching,
        };
        ticket.seq == self.latest_seq && ticket.kind == kind && self.status == expected_status
    }

    fn locate_at(&mut self, point: GeoPoint) {
        self.point = Some(point);
        self.status = Status::Located;
        self.candidates.clear();
        self.last_error = None;
        self.refresh_results();
    }

    fn reset_with(&mut self, issue: Option<SearchIssue>) {
        self.status = Status::Idle;
        self.point = None;
        self.results.clear();
        self.candidates.clear();
        self.last_error = issue;
    }

    fn refresh_results(&mut self) {
        let Some(point) = self.point else {
            self.results.clear();
            return;
        };
        self.results = self
            .catalog
            .within_radius(point, self.radius.km())
            .into_iter()
            .cloned()
            .collect();
        info!(
            lat = point.latitude,
            lon = point.longitude,
            radius_km = self.radius.km(),
            count = self.results.len(),
            "radius search updated"
        );
    }
}
