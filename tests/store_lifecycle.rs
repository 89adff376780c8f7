//! End-to-end store behaviour across load, ingest, sweep and reload.

use chrono::NaiveDate;
use listing_tracker::store::PriceRange;
use listing_tracker::{Listing, ListingStore};
use std::collections::HashSet;
use tempfile::tempdir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

fn listing(id: &str, price: &str) -> Listing {
    Listing {
        price: Some(price.to_string()),
        title: Some(format!("Listing {id}, Dublin")),
        total_images: 3,
        ..Listing::new(id)
    }
}

#[test]
fn deactivation_survives_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");

    {
        let store = ListingStore::open(&path).unwrap();
        store
            .ingest(vec![listing("A", "€1"), listing("B", "€2")], day(1))
            .unwrap();
    }

    let store = ListingStore::open(&path).unwrap();
    let result = store.ingest(vec![listing("A", "€1")], day(2)).unwrap();
    assert_eq!(result.deactivated_count, 1);

    let reloaded = ListingStore::open(&path).unwrap().snapshot();
    let a = reloaded.get("A").unwrap();
    let b = reloaded.get("B").unwrap();
    assert!(a.active);
    assert_eq!(a.last_seen, day(2));
    assert!(!b.active);
    assert_eq!(b.first_seen, day(1));
}

#[test]
fn repeated_ingest_is_idempotent_apart_from_last_seen() {
    let dir = tempdir().unwrap();
    let store = ListingStore::open(dir.path().join("listings.csv")).unwrap();
    let snapshot = vec![listing("1", "€400,000"), listing("2", "POA")];

    let first = store.ingest(snapshot.clone(), day(1)).unwrap();
    let second = store.ingest(snapshot, day(2)).unwrap();

    assert_eq!(first.new_count, 2);
    assert_eq!(second.new_count, 0);
    assert_eq!(second.changed_count, 0);
    assert_eq!(second.deactivated_count, 0);

    let table = store.snapshot();
    for record in table.iter() {
        assert!(record.active);
        assert_eq!(record.first_seen, day(1));
        assert_eq!(record.last_seen, day(2));
    }
}

#[test]
fn identities_stay_unique_across_ingests() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");
    let store = ListingStore::open(&path).unwrap();

    store
        .ingest(vec![listing("x", "€1"), listing("y", "€1"), listing("x", "€2")], day(1))
        .unwrap();
    store
        .ingest(vec![listing("y", "€3"), listing("z", "€4")], day(2))
        .unwrap();

    let table = ListingStore::open(&path).unwrap().snapshot();
    let ids: Vec<_> = table.iter().map(|r| r.id().to_string()).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(ids, vec!["x", "y", "z"]);
    assert_eq!(table.get("x").unwrap().listing.price.as_deref(), Some("€2"));
}

#[test]
fn sweep_persists_only_when_records_are_removed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");
    let store = ListingStore::open(&path).unwrap();
    store
        .ingest(vec![listing("old", "€1"), listing("kept", "€1")], day(1))
        .unwrap();
    store.ingest(vec![listing("kept", "€1")], day(1)).unwrap();

    let removed = store.sweep(7, day(11)).unwrap();

    assert_eq!(removed, 1);
    let reloaded = ListingStore::open(&path).unwrap().snapshot();
    assert!(reloaded.get("old").is_none());
    assert!(reloaded.get("kept").is_some());

    let before = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(store.sweep(7, day(11)).unwrap(), 0);
    let after = std::fs::metadata(&path).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[test]
fn price_query_over_persisted_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");
    ListingStore::open(&path)
        .unwrap()
        .ingest(
            vec![
                listing("1", "€400,000"),
                listing("2", "POA"),
                listing("3", "€600,000"),
            ],
            day(1),
        )
        .unwrap();

    let table = ListingStore::open(&path).unwrap().snapshot();
    let hits: Vec<_> = table
        .within_price_range(&PriceRange::at_most(500_000.0))
        .into_iter()
        .map(|r| r.id())
        .collect();

    assert_eq!(hits, vec!["1"]);
}

#[test]
fn blank_text_fields_match_between_memory_and_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");
    let blank = Listing {
        title: Some(String::new()),
        price: Some(" ".into()),
        ..Listing::new("blank")
    };

    let store = ListingStore::open(&path).unwrap();
    store.ingest(vec![blank.clone()], day(1)).unwrap();
    let in_memory = store.snapshot().get("blank").cloned().unwrap();
    drop(store);

    let reopened = ListingStore::open(&path).unwrap();
    assert_eq!(reopened.snapshot().get("blank"), Some(&in_memory));

    let again = reopened.ingest(vec![blank], day(2)).unwrap();
    assert_eq!(again.changed_count, 0);
    assert_eq!(again.updated_count, 1);
}

#[test]
fn ids_are_kept_byte_for_byte_across_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listings.csv");
    let store = ListingStore::open(&path).unwrap();
    store.ingest(vec![listing("A", "€1")], day(1)).unwrap();

    let result = store.ingest(vec![listing("A ", "€1")], day(2)).unwrap();
    assert_eq!(result.new_count, 1);

    let reloaded = ListingStore::open(&path).unwrap().snapshot();
    let ids: Vec<_> = reloaded.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(ids, vec!["A", "A "]);
    assert!(!reloaded.get("A").unwrap().active);
    assert!(reloaded.get("A ").unwrap().active);
}
