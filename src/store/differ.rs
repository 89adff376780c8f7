use crate::store::ListingTable;
use indexmap::IndexSet;
use std::collections::HashSet;

/// Identities that are active in `table` but absent from `snapshot`.
///
/// Matching is exact and case-sensitive on `id`. Nothing is mutated; the
/// result is in store order.
pub fn diff(table: &ListingTable, snapshot: &HashSet<&str>) -> IndexSet<String> {
    table
        .active()
        .filter(|record| !snapshot.contains(record.id()))
        .map(|record| record.id().to_string())
        .collect()
}
