use crate::models::Listing;
use crate::sources::types::SearchFilters;
use anyhow::Result;
use async_trait::async_trait;

/// Supplies one complete snapshot of listings for a search.
///
/// An `Err` means the whole fetch failed and nothing should be ingested.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch every listing matching `filters`
    async fn fetch(&self, filters: &SearchFilters) -> Result<Vec<Listing>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
