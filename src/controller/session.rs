//! Runs a [`MapSearchController`] as a single tokio task.
//!
//! Device location and place lookups execute in their own tasks and report back through the
//! session's event queue, tagged with the request ticket they were issued under. Every
//! applied transition is published on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::SearchConfig;
use crate::controller::{MapSearchController, MapSearchSnapshot, RequestTicket, Transition};
use crate::error::Result;
use crate::geocoding::resolver::{validate_query, PlaceResolver};
use crate::geocoding::traits::Geocoder;
use crate::geocoding::types::PlaceLookup;
use crate::location::{locate_with_timeout, DeviceLocator, LocationError};
use crate::models::{GeoPoint, RadiusKm};

#[derive(Debug)]
enum Command {
    ClickMap(GeoPoint),
    UseMyLocation,
    SearchText(String),
    SelectCandidate(usize),
    SetRadius(RadiusKm),
    Clear,
    Close,
}

#[derive(Debug)]
enum Event {
    Command(Command),
    Located(RequestTicket, std::result::Result<GeoPoint, LocationError>),
    Resolved(RequestTicket, PlaceLookup),
}

/// Foreground handle to a running map search.
/// Dropping it stops the session task and aborts in-flight lookups without awaiting them.
pub struct MapSearchSession {
    events: mpsc::UnboundedSender<Event>,
    snapshots: watch::Receiver<MapSearchSnapshot>,
    handle: JoinHandle<()>,
}

impl MapSearchSession {
    /// Start a session on the current tokio runtime
    pub fn spawn(
        config: &SearchConfig,
        catalog: Catalog,
        geocoder: Arc<dyn Geocoder>,
        locator: Arc<dyn DeviceLocator>,
    ) -> Result<Self> {
        let controller = MapSearchController::with_config(catalog, config)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let worker = SessionWorker {
            controller,
            resolver: PlaceResolver::new(geocoder, config.result_limit),
            locator,
            location_timeout: config.location_timeout,
            events: events_rx,
            requeue: events_tx.downgrade(),
            snapshots: snapshot_tx,
            locate_task: None,
            search_task: None,
        };
        let handle = tokio::spawn(worker.run());
        info!("Map search session started");

        Ok(Self {
            events: events_tx,
            snapshots: snapshot_rx,
            handle,
        })
    }

    pub fn click_map(&self, point: GeoPoint) {
        self.send(Command::ClickMap(point));
    }

    pub fn use_my_location(&self) {
        self.send(Command::UseMyLocation);
    }

    /// Start a place search. Blank queries are rejected here and never reach the geocoder.
    pub fn search_text(&self, query: &str) -> Result<()> {
        let query = validate_query(query)?;
        self.send(Command::SearchText(query.to_string()));
        Ok(())
    }

    pub fn select_candidate(&self, index: usize) {
        self.send(Command::SelectCandidate(index));
    }

    pub fn set_radius(&self, km: f64) -> Result<()> {
        let radius = RadiusKm::new(km)?;
        self.send(Command::SetRadius(radius));
        Ok(())
    }

    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    /// Close the search UI. Returns immediately; outstanding requests are dropped.
    pub fn close(&self) {
        self.send(Command::Close);
    }

    /// Latest published state
    pub fn snapshot(&self) -> MapSearchSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that sees every published state
    pub fn subscribe(&self) -> watch::Receiver<MapSearchSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.events.send(Event::Command(command)) {
            debug!("Map search session already closed, dropping {:?}", e.0);
        }
    }
}

impl Drop for MapSearchSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct SessionWorker {
    controller: MapSearchController,
    resolver: PlaceResolver,
    locator: Arc<dyn DeviceLocator>,
    location_timeout: Duration,
    events: mpsc::UnboundedReceiver<Event>,
    requeue: mpsc::WeakUnboundedSender<Event>,
    snapshots: watch::Sender<MapSearchSnapshot>,
    locate_task: Option<JoinHandle<()>>,
    search_task: Option<JoinHandle<()>>,
}

impl SessionWorker {
    async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                Event::Command(Command::Close) => {
                    self.abort_in_flight();
                    self.controller.clear();
                    self.publish();
                    break;
                }
                Event::Command(command) => self.handle_command(command),
                Event::Located(ticket, outcome) => {
                    if self.controller.finish_locate(ticket, outcome) == Transition::Applied {
                        self.publish();
                    }
                }
                Event::Resolved(ticket, lookup) => {
                    if self.controller.finish_search(ticket, lookup) == Transition::Applied {
                        self.publish();
                    }
                }
            }
        }
        info!("Map search session closed");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ClickMap(point) => {
                self.abort_in_flight();
                self.controller.click_map(point);
            }
            Command::UseMyLocation => {
                let ticket = self.controller.begin_locate();
                self.spawn_locate(ticket);
            }
            Command::SearchText(query) => match self.controller.begin_search(&query) {
                Ok(ticket) => self.spawn_search(ticket, query),
                Err(e) => {
                    warn!("Ignoring search request: {}", e);
                    return;
                }
            },
            Command::SelectCandidate(index) => {
                if let Err(e) = self.controller.select_candidate(index) {
                    warn!("Ignoring candidate selection: {}", e);
                    return;
                }
            }
            Command::SetRadius(radius) => self.controller.set_radius(radius),
            Command::Clear => {
                self.abort_in_flight();
                self.controller.clear();
            }
            Command::Close => {}
        }
        self.publish();
    }

    fn spawn_locate(&mut self, ticket: RequestTicket) {
        let Some(tx) = self.requeue.upgrade() else {
            return;
        };
        let locator = Arc::clone(&self.locator);
        let limit = self.location_timeout;

        let task = tokio::spawn(async move {
            let outcome = locate_with_timeout(locator.as_ref(), limit).await;
            let _ = tx.send(Event::Located(ticket, outcome));
        });
        if let Some(previous) = self.locate_task.replace(task) {
            previous.abort();
        }
    }

    fn spawn_search(&mut self, ticket: RequestTicket, query: String) {
        let Some(tx) = self.requeue.upgrade() else {
            return;
        };
        let resolver = self.resolver.clone();

        let task = tokio::spawn(async move {
            let lookup = resolver.resolve_validated(&query).await;
            let _ = tx.send(Event::Resolved(ticket, lookup));
        });
        if let Some(previous) = self.search_task.replace(task) {
            previous.abort();
        }
    }

    fn abort_in_flight(&mut self) {
        for task in [self.locate_task.take(), self.search_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

impl Drop for SessionWorker {
    fn drop(&mut self) {
        // a dropped JoinHandle detaches its task, so abort explicitly
        self.abort_in_flight();
    }
}
