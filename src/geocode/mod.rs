//! Address geocoding collaborator and its lookup cache.
//!
//! Providers are plugged in through [`Geocoder`]; [`CachingGeocoder`] makes
//! sure each distinct address string is sent to the provider at most once and
//! can carry its cache across runs as a JSON file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Result of geocoding one address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geocode {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Provider-specific result, kept as returned
    #[serde(default)]
    pub payload: Value,
}

impl Geocode {
    /// No match: no coordinates and an empty payload.
    pub fn empty() -> Self {
        Self {
            latitude: None,
            longitude: None,
            payload: Value::Object(Default::default()),
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Maps a free-form address to coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Geocode>;
}

/// Memoizing wrapper around a [`Geocoder`], keyed by the exact address string.
///
/// Provider failures are logged and remembered as [`Geocode::empty`] so the
/// same address is not retried within the cache's lifetime. Concurrent lookups
/// of one address wait on the same provider call.
pub struct CachingGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<String, Arc<OnceCell<Geocode>>>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Wrap `inner` with a cache loaded from `path`; a missing file starts empty.
    pub async fn load(inner: G, path: &Path) -> Result<Self> {
        let stored: HashMap<String, Geocode> = match tokio::fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Geocoding cache {} is not valid JSON", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read geocoding cache {}", path.display()))
            }
        };
        info!("Loaded {} cached geocodes from {}", stored.len(), path.display());

        let cache = stored
            .into_iter()
            .map(|(address, geocode)| (address, Arc::new(OnceCell::new_with(Some(geocode)))))
            .collect();
        Ok(Self {
            inner,
            cache: Mutex::new(cache),
        })
    }

    pub async fn lookup(&self, address: &str) -> Geocode {
        let cell = {
            let mut cache = self.cache.lock().await;
            cache.entry(address.to_string()).or_default().clone()
        };
        if let Some(hit) = cell.get() {
            debug!("Geocode cache hit for {:?}", address);
            return hit.clone();
        }

        // The map lock is released here; only callers for this address wait.
        cell.get_or_init(|| async {
            match self.inner.geocode(address).await {
                Ok(result) => result,
                Err(err) => {
                    warn!("Error geocoding address {:?}: {:#}", address, err);
                    Geocode::empty()
                }
            }
        })
        .await
        .clone()
    }

    /// Number of resolved addresses.
    pub async fn len(&self) -> usize {
        self.cache
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Write resolved addresses to `path` as a JSON object keyed by address.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = {
            let cache = self.cache.lock().await;
            let resolved: HashMap<&str, &Geocode> = cache
                .iter()
                .filter_map(|(address, cell)| Some((address.as_str(), cell.get()?)))
                .collect();
            serde_json::to_string_pretty(&resolved)?
        };
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write geocoding cache {}", path.display()))?;
        info!("Saved geocoding cache to {}", path.display());
        Ok(())
    }
}
