//! Transport REST API client.
//!
//! This module provides an HTTP client for `db.transport.rest`-style APIs,
//! which plan journeys between stations and list station metadata.
//!
//! Key characteristics of the API:
//! - Journeys are a list of legs; each leg carries ISO-8601 departure and
//!   arrival timestamps with a UTC offset
//! - Cancelled legs report `null` prognosed times alongside planned ones
//! - `/stations` returns a map of id → location object

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_BASE_URL, JourneyQuery, TransportClient, TransportConfig};
pub use convert::{ConversionError, convert_journeys};
pub use error::FetchError;
pub use types::{JourneyDto, JourneysResponse, LegDto, StationDto};
