//! Transport API response DTOs.
//!
//! These types map directly to the JSON returned by the REST API. They use
//! `Option` for every field whose absence we need to report ourselves,
//! rather than letting serde reject the whole body.

use serde::{Deserialize, Serialize};

/// Response from `GET /journeys`.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneysResponse {
    /// Planned journeys, earliest first.
    pub journeys: Option<Vec<JourneyDto>>,
}

/// One planned journey.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyDto {
    /// Vehicle segments in travel order.
    pub legs: Option<Vec<LegDto>>,
}

/// One leg of a journey.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDto {
    /// Prognosed departure (ISO 8601). `null` for cancelled legs.
    pub departure: Option<String>,

    /// Timetabled departure (ISO 8601).
    pub planned_departure: Option<String>,

    /// Prognosed arrival (ISO 8601). `null` for cancelled legs.
    pub arrival: Option<String>,

    /// Timetabled arrival (ISO 8601).
    pub planned_arrival: Option<String>,
}

/// A location in the `GET /stations` directory.
///
/// The directory carries many more fields (coordinates, products, ...);
/// only the ones needed to resolve names are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StationDto {
    pub id: String,
    pub name: String,
}

/// Response from `GET /stations/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationNameDto {
    pub name: String,
}
