use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub retention_days: u32,
    pub feed_url: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub feed_max_pages: u32,
    pub feed_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            db_path: non_empty("LISTINGS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("daft_listings.csv")),
            retention_days: parse_or(non_empty("RETENTION_DAYS"), 7)
                .context("RETENTION_DAYS must be a whole number of days")?,
            feed_url: non_empty("LISTING_FEED_URL"),
            snapshot_path: non_empty("LISTING_SNAPSHOT_PATH").map(PathBuf::from),
            feed_max_pages: parse_or(non_empty("FEED_MAX_PAGES"), 50)
                .context("FEED_MAX_PAGES must be a valid number")?,
            feed_timeout: Duration::from_secs(
                parse_or(non_empty("FEED_TIMEOUT_SECS"), 30)
                    .context("FEED_TIMEOUT_SECS must be a valid number")?,
            ),
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.trim().parse()?),
        None => Ok(default),
    }
}
