use anyhow::Result;
use chrono::Local;
use listing_tracker::config::Config;
use listing_tracker::sources::{FeedSource, ListingSource, SearchFilters, SnapshotFileSource};
use listing_tracker::store::PriceRange;
use listing_tracker::{refresh, Field, ListingStore, StoreStats};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🏠 Listing Tracker");
    info!("==================");

    let config = Config::from_env()?;
    let store = Arc::new(ListingStore::open(&config.db_path)?);
    let today = Local::now().date_naive();

    log_stats(&store.stats());

    match configured_source(&config)? {
        Some(source) => {
            refresh(store.clone(), source.as_ref(), &SearchFilters::default(), today).await?;
        }
        None => warn!("No LISTING_FEED_URL or LISTING_SNAPSHOT_PATH set, skipping refresh"),
    }

    let removed = store.sweep(config.retention_days, today)?;
    if removed > 0 {
        info!("🧹 Cleaned up {} old inactive listings", removed);
    }

    log_stats(&store.stats());

    let table = store.snapshot();
    let virtual_tours = table.matching(&[
        (Field::HasVirtualTour, true.into()),
        (Field::Active, true.into()),
    ]);
    info!("Found {} active properties with virtual tours", virtual_tours.len());

    let for_sale = table.matching(&[(Field::SaleType, "sale".into()), (Field::Active, true.into())]);
    info!("Found {} active properties for sale", for_sale.len());

    let with_images = table.with_min_images(5);
    info!("Found {} properties with 5+ images", with_images.len());

    let affordable = table.within_price_range(&PriceRange::at_most(500_000.0));
    info!("Found {} properties under €500,000", affordable.len());

    Ok(())
}

fn configured_source(config: &Config) -> Result<Option<Box<dyn ListingSource>>> {
    if let Some(url) = &config.feed_url {
        let feed = FeedSource::new(url.clone(), config.feed_timeout, config.feed_max_pages)?;
        return Ok(Some(Box::new(feed)));
    }
    Ok(config
        .snapshot_path
        .as_ref()
        .map(|path| Box::new(SnapshotFileSource::new(path)) as Box<dyn ListingSource>))
}

fn log_stats(stats: &StoreStats) {
    info!("📊 Database stats:");
    info!("  Total listings: {}", stats.total);
    info!("  Active: {}", stats.active);
    info!("  Inactive: {}", stats.inactive);
    if let Some((earliest, latest)) = stats.inactive_last_seen {
        info!("  Inactive date range: {} to {}", earliest, latest);
    }
}
