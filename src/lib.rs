//! Tracks property listings across repeated snapshots.
//!
//! Each snapshot from a [`ListingSource`](sources::ListingSource) is merged
//! into a CSV-backed [`ListingStore`](store::ListingStore) that remembers when
//! every listing was first and last seen and whether it is still on the
//! market. Inactive listings are swept after a retention window.

pub mod config;
pub mod error;
pub mod geocode;
pub mod models;
pub mod price;
pub mod sources;
pub mod store;
pub mod sync;

pub use error::StoreError;
pub use models::{Field, FieldValue, Listing, ListingRecord};
pub use price::normalize_price;
pub use store::{ListingStore, ListingTable, MergeResult, StoreStats};
pub use sync::refresh;
