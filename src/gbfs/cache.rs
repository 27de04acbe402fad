//! TTL cache around snapshot fetching.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::debug;

use super::FeedClient;
use crate::locate::RegionResolver;
use crate::models::Snapshot;

struct Cached {
    snapshot: Arc<Snapshot>,
    fetched_at: Instant,
}

/// Serves the annotated snapshot, refreshing from the feeds once the cached
/// copy is older than the TTL.
///
/// A failed refresh propagates its error and leaves the slot untouched, so
/// the next caller retries.
pub struct SnapshotCache {
    client: FeedClient,
    resolver: Arc<RegionResolver>,
    ttl: Duration,
    slot: RwLock<Option<Cached>>,
}

impl SnapshotCache {
    pub fn new(client: FeedClient, resolver: Arc<RegionResolver>, ttl: Duration) -> Self {
        Self {
            client,
            resolver,
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Current snapshot, refreshed when stale.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        let mut slot = self.slot.write().await;

        // Lost the race: another task refreshed while we waited on the lock
        if let Some(cached) = slot
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
        {
            return Ok(Arc::clone(&cached.snapshot));
        }

        let mut snapshot = self.client.fetch_snapshot().await?;
        snapshot.unlocated = self.resolver.annotate(&mut snapshot.stations);
        debug!(
            "Snapshot refreshed: {} stations, {} unlocated",
            snapshot.stations.len(),
            snapshot.unlocated.count()
        );

        let snapshot = Arc::new(snapshot);
        *slot = Some(Cached {
            snapshot: Arc::clone(&snapshot),
            fetched_at: Instant::now(),
        });

        Ok(snapshot)
    }

    async fn fresh(&self) -> Option<Arc<Snapshot>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.snapshot))
    }

    #[cfg(test)]
    async fn prime(&self, snapshot: Snapshot) {
        let mut slot = self.slot.write().await;
        *slot = Some(Cached {
            snapshot: Arc::new(snapshot),
            fetched_at: Instant::now(),
        });
    }
}
