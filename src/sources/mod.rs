pub mod extract;
pub mod feed;
pub mod file;
pub mod traits;
pub mod types;

pub use feed::FeedSource;
pub use file::SnapshotFileSource;
pub use traits::ListingSource;
pub use types::SearchFilters;
