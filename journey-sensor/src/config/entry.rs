//! Persisted config entries and their schema migration.
//!
//! An entry is one configured origin/destination pair. Entries are stored
//! with a `(version, minor_version)` pair:
//!
//! - 1.1 stored the stations as `source` / `target`
//! - 1.2 (current) stores them as `from` / `to`
//!
//! Minor bumps are migrated in place on load. A major version newer than
//! ours means a downgrade and is refused.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::StationId;
use crate::transport::DEFAULT_BASE_URL;

use super::error::ConfigError;

/// Schema version written by this program.
pub const CURRENT_VERSION: u32 = 1;

/// Schema minor version written by this program.
pub const CURRENT_MINOR_VERSION: u32 = 2;

/// Upper bound on journeys exposed per entry.
pub const MAX_JOURNEYS: usize = 10;

/// Connection data produced by the setup flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    /// Base URL of the transport API
    pub host: String,
    #[serde(rename = "from")]
    pub from_station_id: StationId,
    #[serde(rename = "to")]
    pub to_station_id: StationId,
}

/// User-adjustable options. Changing them reloads the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// How many upcoming journeys get their own sensors.
    #[serde(default = "default_max_journeys")]
    pub max_journeys: usize,
}

fn default_max_journeys() -> usize {
    1
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            max_journeys: default_max_journeys(),
        }
    }
}

impl EntryOptions {
    /// Check the options are within bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_journeys == 0 || self.max_journeys > MAX_JOURNEYS {
            return Err(format!(
                "max_journeys must be between 1 and {MAX_JOURNEYS}, got {}",
                self.max_journeys
            ));
        }
        Ok(())
    }
}

/// A config entry at the current schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryConfig {
    pub entry_id: String,
    pub version: u32,
    pub minor_version: u32,
    pub title: String,
    pub data: EntryData,
    pub options: EntryOptions,
}

impl EntryConfig {
    /// Create a new entry with a fresh id at the current schema version.
    pub fn new(title: impl Into<String>, data: EntryData, options: EntryOptions) -> Self {
        Self {
            entry_id: uuid::Uuid::now_v7().simple().to_string(),
            version: CURRENT_VERSION,
            minor_version: CURRENT_MINOR_VERSION,
            title: title.into(),
            data,
            options,
        }
    }

    /// Whether this entry polls the same pair on the same host as `other`.
    pub fn same_pair(&self, other: &EntryData) -> bool {
        self.data.host.trim_end_matches('/') == other.host.trim_end_matches('/')
            && self.data.from_station_id == other.from_station_id
            && self.data.to_station_id == other.to_station_id
    }
}

/// An entry as read from disk, at whatever version wrote it.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredEntry {
    pub entry_id: String,
    pub version: u32,
    #[serde(default = "legacy_minor_version")]
    pub minor_version: u32,
    #[serde(default)]
    pub title: String,
    pub data: Map<String, Value>,
    #[serde(default)]
    pub options: EntryOptions,
}

fn legacy_minor_version() -> u32 {
    1
}

/// Bring a stored entry up to the current schema.
///
/// Returns the entry and whether anything changed.
pub fn migrate(stored: StoredEntry) -> Result<(EntryConfig, bool), ConfigError> {
    let StoredEntry {
        entry_id,
        version,
        mut minor_version,
        title,
        mut data,
        options,
    } = stored;

    if version > CURRENT_VERSION {
        return Err(ConfigError::Downgrade { entry_id, version });
    }

    let mut migrated = false;

    if version == 1 && minor_version < 2 {
        for (old, new) in [("source", "from"), ("target", "to")] {
            if let Some(value) = data.remove(old) {
                data.entry(new).or_insert(value);
            }
        }
        info!(entry = %entry_id, from = minor_version, to = 2, "migrated config entry");
        minor_version = 2;
        migrated = true;
    }

    // Entries from before hosts were configurable used the public instance
    if !data.contains_key("host") {
        data.insert("host".to_string(), Value::String(DEFAULT_BASE_URL.to_string()));
        migrated = true;
    }

    let data: EntryData =
        serde_json::from_value(Value::Object(data)).map_err(|e| ConfigError::InvalidEntry {
            entry_id: entry_id.clone(),
            message: e.to_string(),
        })?;

    options.validate().map_err(|message| ConfigError::InvalidEntry {
        entry_id: entry_id.clone(),
        message,
    })?;

    let title = if title.is_empty() {
        format!("{} <> {}", data.from_station_id, data.to_station_id)
    } else {
        title
    };

    let config = EntryConfig {
        entry_id,
        version,
        minor_version,
        title,
        data,
        options,
    };

    Ok((config, migrated))
}
