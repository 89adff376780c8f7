use crate::sources::{ListingSource, SearchFilters};
use crate::store::{ListingStore, MergeResult};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Fetch a snapshot from `source` and ingest it as observed on `today`.
///
/// The fetch completes before the store is touched, so a failed fetch leaves
/// the store exactly as it was.
pub async fn refresh(
    store: Arc<ListingStore>,
    source: &dyn ListingSource,
    filters: &SearchFilters,
    today: NaiveDate,
) -> Result<MergeResult> {
    let listings = source
        .fetch(filters)
        .await
        .with_context(|| format!("Failed to fetch listings from {}", source.source_name()))?;
    info!(
        source = source.source_name(),
        fetched = listings.len(),
        "Fetched listing snapshot"
    );

    // Merge and save are blocking file work.
    let result = tokio::task::spawn_blocking(move || store.ingest(listings, today))
        .await
        .context("Ingest task did not complete")??;

    info!(
        "Database updated: {} new listings, {} updated, {} deactivated",
        result.new_count, result.updated_count, result.deactivated_count
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Listing;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct FixedSource {
        listings: Vec<Listing>,
    }

    #[async_trait]
    impl ListingSource for FixedSource {
        async fn fetch(&self, _filters: &SearchFilters) -> Result<Vec<Listing>> {
            Ok(self.listings.clone())
        }

        fn source_name(&self) -> &'static str {
            "fixed"
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl ListingSource for BrokenSource {
        async fn fetch(&self, _filters: &SearchFilters) -> Result<Vec<Listing>> {
            anyhow::bail!("connection reset")
        }

        fn source_name(&self) -> &'static str {
            "broken"
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    #[tokio::test]
    async fn refresh_ingests_fetched_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let store = Arc::new(ListingStore::open(&path).unwrap());
        let source = FixedSource {
            listings: vec![Listing::new("1"), Listing::new("2")],
        };

        let result = refresh(store.clone(), &source, &SearchFilters::default(), day(1))
            .await
            .unwrap();

        assert_eq!(result.new_count, 2);
        assert_eq!(ListingStore::open(&path).unwrap().snapshot().len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let store = Arc::new(ListingStore::open(&path).unwrap());
        let seed = FixedSource {
            listings: vec![Listing::new("1")],
        };
        refresh(store.clone(), &seed, &SearchFilters::default(), day(1))
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = refresh(store.clone(), &BrokenSource, &SearchFilters::default(), day(2))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("connection reset"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let record = store.snapshot().get("1").cloned().unwrap();
        assert!(record.active);
        assert_eq!(record.last_seen, day(1));
    }
}
