//! Station directory used during setup.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::StationId;
use crate::transport::StationDto;

/// All stations a host knows, for resolving user-chosen names to ids.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    /// Keyed by name; the first id listed for a name wins.
    by_name: BTreeMap<String, StationId>,
}

impl StationDirectory {
    /// Build the directory from a `GET /stations` response.
    ///
    /// Entries whose id is not a usable station id are skipped.
    pub fn from_stations(stations: BTreeMap<String, StationDto>) -> Self {
        let mut by_name = BTreeMap::new();

        for (key, station) in stations {
            match StationId::parse(&station.id) {
                Ok(id) => {
                    by_name.entry(station.name).or_insert(id);
                }
                Err(e) => debug!(key = %key, error = %e, "skipping station with unusable id"),
            }
        }

        Self { by_name }
    }

    /// Selectable station names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// The id of the station called `name`.
    pub fn resolve(&self, name: &str) -> Option<&StationId> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
