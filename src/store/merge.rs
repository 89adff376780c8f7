use crate::models::{Listing, ListingRecord};
use crate::store::{differ, ListingTable};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Outcome of merging one snapshot into the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Identities seen for the first time
    pub new_count: usize,
    /// Identities already stored and observed again
    pub updated_count: usize,
    /// Previously active identities missing from the snapshot
    pub deactivated_count: usize,
    /// Re-observed identities whose listing fields differ from the stored copy
    pub changed_count: usize,
    /// Extra occurrences of an identity within the snapshot
    pub duplicate_count: usize,
    /// Entries dropped for having no identity
    pub skipped_count: usize,
}

/// Merge `incoming` into `table` as observed on `today`.
///
/// When an identity occurs more than once the last occurrence wins and it is
/// counted once. `first_seen` is never touched for stored identities, and
/// `last_seen` never moves backwards.
pub fn merge(table: &mut ListingTable, incoming: Vec<Listing>, today: NaiveDate) -> MergeResult {
    let mut result = MergeResult::default();
    let total = incoming.len();

    // Insertion keeps the first position and replaces the payload, so new rows
    // land in first-occurrence order carrying their last-occurrence data.
    let mut latest: IndexMap<String, Listing> = IndexMap::with_capacity(total);
    for listing in incoming {
        if listing.id.trim().is_empty() {
            result.skipped_count += 1;
            continue;
        }
        // Compare and store the same shape the store file can represent.
        let listing = listing.normalized();
        latest.insert(listing.id.clone(), listing);
    }
    result.duplicate_count = total - result.skipped_count - latest.len();

    let missing = {
        let seen: HashSet<&str> = latest.keys().map(String::as_str).collect();
        differ::diff(table, &seen)
    };

    for (id, listing) in latest {
        match table.get_mut(&id) {
            Some(record) => {
                if record.listing != listing {
                    result.changed_count += 1;
                }
                record.listing = listing;
                record.last_seen = record.last_seen.max(today);
                record.active = true;
                result.updated_count += 1;
            }
            None => {
                table.insert(ListingRecord::first_observation(listing, today));
                result.new_count += 1;
            }
        }
    }

    for id in &missing {
        if let Some(record) = table.get_mut(id) {
            record.active = false;
            result.deactivated_count += 1;
        }
    }

    if result.duplicate_count > 0 {
        warn!(
            incoming = total,
            unique = total - result.skipped_count - result.duplicate_count,
            "Duplicate identities in snapshot, keeping the last occurrence of each"
        );
    }
    if result.skipped_count > 0 {
        warn!(skipped = result.skipped_count, "Dropped listings without an id");
    }

    let stats = table.stats();
    info!(
        total = stats.total,
        active = stats.active,
        inactive = stats.inactive,
        incoming = total,
        unique = total - result.skipped_count - result.duplicate_count,
        new = result.new_count,
        updated = result.updated_count,
        changed = result.changed_count,
        deactivated = result.deactivated_count,
        "Merged listing snapshot"
    );

    result
}
