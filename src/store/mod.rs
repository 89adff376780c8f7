pub mod differ;
pub mod merge;
pub mod persist;
pub mod query;
pub mod sweep;

pub use merge::MergeResult;
pub use query::{BoundingBox, PriceRange};

use crate::error::Result;
use crate::models::{Listing, ListingRecord};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// In-memory listing table keyed by identity, kept in first-observation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingTable {
    rows: IndexMap<String, ListingRecord>,
}

impl ListingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ListingRecord> {
        self.rows.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingRecord> {
        self.rows.values()
    }

    pub fn active(&self) -> impl Iterator<Item = &ListingRecord> {
        self.iter().filter(|record| record.active)
    }

    /// Insert a record, returning the one it replaced (same identity).
    pub fn insert(&mut self, record: ListingRecord) -> Option<ListingRecord> {
        self.rows.insert(record.id().to_string(), record)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ListingRecord> {
        self.rows.get_mut(id)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&ListingRecord) -> bool) {
        self.rows.retain(|_, record| keep(record));
    }

    pub fn stats(&self) -> StoreStats {
        let active = self.active().count();
        let inactive_last_seen = self
            .iter()
            .filter(|record| !record.active)
            .map(|record| record.last_seen)
            .fold(None, |range: Option<(NaiveDate, NaiveDate)>, day| match range {
                None => Some((day, day)),
                Some((lo, hi)) => Some((lo.min(day), hi.max(day))),
            });

        StoreStats {
            total: self.len(),
            active,
            inactive: self.len() - active,
            inactive_last_seen,
        }
    }
}

/// Counts describing the store contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Earliest and latest `last_seen` among inactive records
    pub inactive_last_seen: Option<(NaiveDate, NaiveDate)>,
}

/// Handle to the durable listing store.
///
/// Mutations (ingest, sweep) are serialized on a writer lock and run against a
/// private copy of the table. The copy is persisted first and only then
/// published, so a failed save leaves both the file and the in-memory view at
/// their previous state. Readers take an `Arc` to whichever table is current
/// and never see a half-merged one.
pub struct ListingStore {
    path: PathBuf,
    writer: Mutex<()>,
    current: RwLock<Arc<ListingTable>>,
}

impl ListingStore {
    /// Load the store at `path`; a missing file opens an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = persist::load(&path)?;
        info!(
            path = %path.display(),
            rows = table.len(),
            "Opened listing store"
        );

        Ok(Self {
            path,
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(table)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consistent view of the table as of the last completed mutation.
    pub fn snapshot(&self) -> Arc<ListingTable> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn stats(&self) -> StoreStats {
        self.snapshot().stats()
    }

    /// Merge one snapshot of listings observed on `today` and persist the result.
    pub fn ingest(&self, incoming: Vec<Listing>, today: NaiveDate) -> Result<MergeResult> {
        self.mutate(|table| {
            let result = merge::merge(table, incoming, today);
            (result, true)
        })
    }

    /// Drop inactive records last seen more than `retention_days` before `as_of`.
    ///
    /// The store file is only rewritten when something was removed.
    pub fn sweep(&self, retention_days: u32, as_of: NaiveDate) -> Result<usize> {
        self.mutate(|table| {
            let removed = sweep::sweep(table, retention_days, as_of);
            (removed, removed > 0)
        })
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut ListingTable) -> (T, bool)) -> Result<T> {
        // The published table is only ever replaced wholesale, so a poisoned
        // lock still guards a consistent value.
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut table = ListingTable::clone(&self.snapshot());
        let (outcome, dirty) = apply(&mut table);

        if dirty {
            persist::save(&self.path, &table)?;
            debug!(path = %self.path.display(), rows = table.len(), "Persisted listing store");
        }

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(table);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn stats_report_inactive_date_range() {
        let mut table = ListingTable::new();
        table.insert(ListingRecord::first_observation(Listing::new("a"), day(1)));
        for (id, seen) in [("b", day(3)), ("c", day(9))] {
            let mut record = ListingRecord::first_observation(Listing::new(id), seen);
            record.active = false;
            table.insert(record);
        }

        let stats = table.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.inactive, 2);
        assert_eq!(stats.inactive_last_seen, Some((day(3), day(9))));
    }

    #[test]
    fn snapshot_taken_before_ingest_is_unchanged() {
        let dir = tempdir().unwrap();
        let store = ListingStore::open(dir.path().join("listings.csv")).unwrap();

        let before = store.snapshot();
        store.ingest(vec![Listing::new("1")], day(1)).unwrap();

        assert!(before.is_empty());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn failed_save_keeps_previous_state() {
        let dir = tempdir().unwrap();
        // A directory where the store file should be makes the final rename fail.
        let path = dir.path().join("listings.csv");
        std::fs::create_dir(&path).unwrap();
        let store = ListingStore {
            path: path.clone(),
            writer: Mutex::new(()),
            current: RwLock::new(Arc::new(ListingTable::new())),
        };

        let result = store.ingest(vec![Listing::new("1")], day(1));

        assert!(result.is_err());
        assert!(store.snapshot().is_empty());
        assert!(path.is_dir());
    }

    #[test]
    fn concurrent_mutations_are_serialized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let store = ListingStore::open(&path).unwrap();
        let batch = |prefix: &str| -> Vec<Listing> {
            (0..10).map(|i| Listing::new(format!("{prefix}{i}"))).collect()
        };

        let new_counts: Vec<usize> = std::thread::scope(|scope| {
            let workers: Vec<_> = ["a", "b"]
                .into_iter()
                .map(|prefix| {
                    let store = &store;
                    let listings = batch(prefix);
                    scope.spawn(move || {
                        let mut new = 0;
                        for _ in 0..25 {
                            new += store.ingest(listings.clone(), day(1)).unwrap().new_count;
                            assert_eq!(store.sweep(7, day(2)).unwrap(), 0);
                        }
                        new
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        // Every identity is counted as new exactly once, so no merge was lost.
        assert_eq!(new_counts.iter().sum::<usize>(), 20);
        let current = store.snapshot();
        assert_eq!(current.len(), 20);
        assert_eq!(persist::load(&path).unwrap(), *current);
    }

    #[test]
    fn sweep_without_removals_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        let store = ListingStore::open(&path).unwrap();

        assert_eq!(store.sweep(7, day(20)).unwrap(), 0);
        assert!(!path.exists());
    }
}
