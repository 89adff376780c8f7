use crate::store::ListingTable;
use chrono::{Days, NaiveDate};
use tracing::info;

/// Remove inactive records whose `last_seen` is older than `as_of - retention_days`.
///
/// Active records are kept regardless of age. Returns the number removed.
pub fn sweep(table: &mut ListingTable, retention_days: u32, as_of: NaiveDate) -> usize {
    let cutoff = as_of
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN);
    let before = table.len();

    table.retain(|record| record.active || record.last_seen >= cutoff);

    let removed = before - table.len();
    if removed > 0 {
        info!(removed, %cutoff, "Cleaned up old inactive listings");
    }
    removed
}
