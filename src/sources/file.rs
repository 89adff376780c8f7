use crate::models::Listing;
use crate::sources::extract::listings_from_values;
use crate::sources::traits::ListingSource;
use crate::sources::types::SearchFilters;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Listing source reading a previously captured snapshot from a JSON file.
///
/// The file holds either an array of listings or `{ "listings": [...] }`.
/// Filters are not applied; the file is the snapshot.
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn entries(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("listings") {
            Some(Value::Array(items)) => Ok(items),
            _ => anyhow::bail!("Snapshot object has no \"listings\" array"),
        },
        _ => anyhow::bail!("Snapshot must be an array or an object with \"listings\""),
    }
}

#[async_trait]
impl ListingSource for SnapshotFileSource {
    async fn fetch(&self, filters: &SearchFilters) -> Result<Vec<Listing>> {
        info!("Reading listing snapshot from {}", self.path.display());
        debug!(?filters, "Snapshot files ignore search filters");

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        let document: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Snapshot {} is not valid JSON", self.path.display()))?;

        Ok(listings_from_values(&entries(document)?))
    }

    fn source_name(&self) -> &'static str {
        "snapshot-file"
    }
}
