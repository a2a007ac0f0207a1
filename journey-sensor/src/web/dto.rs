//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EntryOptions;
use crate::coordinator::CoordinatorState;
use crate::registry::EntrySnapshot;
use crate::sensor::{DeviceClass, SensorValue, SensorView};

/// Request to list the stations a host knows.
#[derive(Debug, Deserialize)]
pub struct SetupStationsRequest {
    /// Base URL of the transport API
    pub host: String,
}

/// Station names available for an entry.
#[derive(Debug, Serialize)]
pub struct SetupStationsResponse {
    pub stations: Vec<String>,
}

/// Request to create an entry.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// Base URL of the transport API
    pub host: String,

    /// Origin station name
    pub from: String,

    /// Destination station name
    pub to: String,

    /// How many journeys get sensors (defaults to 1)
    pub max_journeys: Option<usize>,
}

impl CreateEntryRequest {
    /// Options for the new entry.
    pub fn options(&self) -> EntryOptions {
        self.max_journeys
            .map(|max_journeys| EntryOptions { max_journeys })
            .unwrap_or_default()
    }
}

/// Request to change an entry's options.
#[derive(Debug, Deserialize)]
pub struct UpdateOptionsRequest {
    pub max_journeys: usize,
}

/// Outcome of the latest refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResult {
    /// Journeys currently held
    pub journeys: usize,

    /// Time of the last successful refresh
    pub last_refresh: Option<DateTime<Utc>>,

    /// Time of the last failed refresh
    pub last_failure: Option<DateTime<Utc>>,

    /// Error from the last failed refresh
    pub last_error: Option<String>,

    /// Failed refreshes since the last success
    pub consecutive_failures: u32,
}

/// A configured entry.
#[derive(Debug, Serialize)]
pub struct EntryResult {
    pub entry_id: String,
    pub title: String,
    pub host: String,

    /// Origin station id
    pub from: String,

    /// Destination station id
    pub to: String,

    pub max_journeys: usize,

    /// Display name, `"{from} => {to}"`
    pub device_name: String,

    pub refresh: RefreshResult,
}

/// Response listing entries.
#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<EntryResult>,
}

/// A sensor and its current value.
#[derive(Debug, Serialize)]
pub struct SensorResult {
    pub unique_id: String,
    pub name: String,
    pub device_name: String,
    pub key: &'static str,

    /// Journey position, from 0
    pub index: usize,

    pub device_class: DeviceClass,
    pub icon: Option<&'static str>,
    pub unit: Option<&'static str>,

    /// `null` when unknown
    pub value: SensorValue,

    pub available: bool,
}

/// Response listing sensors.
#[derive(Debug, Serialize)]
pub struct SensorsResponse {
    pub sensors: Vec<SensorResult>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Stable code for setup errors (e.g. `cannot_connect`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

// Conversion implementations

impl RefreshResult {
    /// Create from a coordinator state.
    pub fn from_state(state: &CoordinatorState) -> Self {
        Self {
            journeys: state.journeys().len(),
            last_refresh: state.last_refresh(),
            last_failure: state.last_failure(),
            last_error: state.last_error().map(str::to_string),
            consecutive_failures: state.consecutive_failures(),
        }
    }
}

impl EntryResult {
    /// Create from a registry snapshot.
    pub fn from_snapshot(snapshot: &EntrySnapshot) -> Self {
        let config = &snapshot.config;
        Self {
            entry_id: config.entry_id.clone(),
            title: config.title.clone(),
            host: config.data.host.clone(),
            from: config.data.from_station_id.to_string(),
            to: config.data.to_station_id.to_string(),
            max_journeys: config.options.max_journeys,
            device_name: snapshot.device_name.clone(),
            refresh: RefreshResult::from_state(&snapshot.state),
        }
    }
}

impl SensorResult {
    /// Create from a sensor view, reading its current value.
    pub fn from_view(view: &SensorView) -> Self {
        let descriptor = view.descriptor();
        Self {
            unique_id: view.unique_id().to_string(),
            name: view.name().to_string(),
            device_name: view.device_name().to_string(),
            key: descriptor.key,
            index: view.index(),
            device_class: descriptor.device_class,
            icon: descriptor.icon,
            unit: descriptor.unit,
            value: view.current_value(),
            available: view.available(),
        }
    }
}
