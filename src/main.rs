use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use estate_map_search::{
    Catalog, FixedLocator, MapSearchSession, MapSearchSnapshot, NominatimGeocoder, SearchConfig,
    Status,
};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const WAIT_LIMIT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Estate Map Search");
    info!("====================");

    let mut args = std::env::args().skip(1);
    let query = args.next();
    let radius_km = match args.next() {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("Radius must be a number, got {:?}", raw))?,
        None => 10.0,
    };

    let config = SearchConfig::from_env().context("Invalid search configuration")?;
    let catalog = Catalog::global().clone();
    info!("Catalog holds {} properties", catalog.len());

    let geocoder = Arc::new(NominatimGeocoder::with_config(&config)?);
    // No device API on the command line: "my location" is the configured map center
    let locator = Arc::new(FixedLocator::at(config.default_center));

    let session = MapSearchSession::spawn(&config, catalog, geocoder, locator)?;
    session.set_radius(radius_km)?;
    let mut updates = session.subscribe();

    match query {
        Some(query) => {
            info!("Looking up {:?}...", query);
            session.search_text(&query)?;
            let snapshot = settle(&mut updates, |s| {
                !s.candidates.is_empty() || s.last_error.is_some()
            })
            .await?;

            if let Some(first) = snapshot.candidates.first() {
                info!("Using {}", first.display_name);
                session.select_candidate(0);
            }
        }
        None => {
            info!("No place given, searching around the default location");
            session.use_my_location();
        }
    }

    let snapshot = settle(&mut updates, |s| {
        s.status == Status::Located || s.last_error.is_some()
    })
    .await?;
    session.close();

    if snapshot.status != Status::Located {
        warn!("{}", snapshot.message());
        return Ok(());
    }

    // Display results
    info!("\n✅ {}\n", snapshot.message());

    for (i, property) in snapshot.results.iter().enumerate() {
        println!("{}. {} ({})", i + 1, property.address, property.price);
        println!("   {} beds, {} baths, {} sqft", property.beds, property.baths, property.sqft);
        println!("   City: {}", property.city);
        println!("   ID: {}", property.id);
        println!();
    }

    let json = serde_json::to_string_pretty(&snapshot)?;
    tokio::fs::write("map_search_results.json", json).await?;
    info!("💾 Saved results to map_search_results.json");
    info!("Listing link: /properties?ids={}", snapshot.result_ids_param());

    Ok(())
}

async fn settle(
    updates: &mut watch::Receiver<MapSearchSnapshot>,
    done: impl FnMut(&MapSearchSnapshot) -> bool,
) -> Result<MapSearchSnapshot> {
    let snapshot = tokio::time::timeout(WAIT_LIMIT, updates.wait_for(done))
        .await
        .context("Timed out waiting for the map search")?
        .context("Map search session stopped")?;
    Ok(snapshot.clone())
}
