//! Live station feed access: wire models, fetch client, TTL cache.

mod cache;
mod client;
mod types;

pub use cache::SnapshotCache;
pub use client::{merge_feeds, FeedClient, DEFAULT_INFORMATION_URL, DEFAULT_STATUS_URL};
pub use types::{split_bike_types, BikeCounts, Feed, RawStationInformation, RawStationStatus};
