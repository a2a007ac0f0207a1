//! Station name lookup.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::warn;

use crate::domain::StationId;
use crate::transport::{FetchError, TransportClient};

/// Cache key: (API host, station id). Ids are only unique per host.
type NameKey = (String, StationId);

/// Default TTL for cached names: 24 hours.
const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum number of cached names.
const DEFAULT_MAX_CAPACITY: u64 = 1000;

/// Thread-safe station id → display name lookup.
///
/// Names are fetched from `GET /stations/{id}` on first use and cached.
/// Concurrent lookups of the same station share one request.
#[derive(Clone)]
pub struct StationNames {
    names: MokaCache<NameKey, String>,
}

impl StationNames {
    /// Create a lookup with the default TTL (24 hours).
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a lookup with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        let names = MokaCache::builder()
            .time_to_live(ttl)
            .max_capacity(DEFAULT_MAX_CAPACITY)
            .build();

        Self { names }
    }

    /// Look up a station name, fetching it if not cached.
    pub async fn try_name(
        &self,
        client: &TransportClient,
        id: &StationId,
    ) -> Result<String, Arc<FetchError>> {
        let key = (client.base_url().to_string(), id.clone());
        self.names
            .try_get_with(key, async { client.station_name(id).await })
            .await
    }

    /// Look up a station name, falling back to the id on failure.
    pub async fn name(&self, client: &TransportClient, id: &StationId) -> String {
        match self.try_name(client, id).await {
            Ok(name) => name,
            Err(e) => {
                warn!(station = %id, error = %e, "station name lookup failed, using id");
                id.to_string()
            }
        }
    }

    /// Display name for an origin/destination pair: `"{from} => {to}"`.
    ///
    /// Both names are looked up concurrently.
    pub async fn pair_name(
        &self,
        client: &TransportClient,
        from: &StationId,
        to: &StationId,
    ) -> String {
        let (from_name, to_name) = futures::join!(self.name(client, from), self.name(client, to));
        format!("{from_name} => {to_name}")
    }

    /// Invalidate all cached names.
    pub fn invalidate_all(&self) {
        self.names.invalidate_all();
    }
}

impl Default for StationNames {
    fn default() -> Self {
        Self::new()
    }
}
