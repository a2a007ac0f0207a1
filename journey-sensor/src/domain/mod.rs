//! Domain types for journey sensors.
//!
//! These types represent validated data derived from the transport API.
//! They enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod journey;
mod station;
mod time;

pub use journey::JourneyRecord;
pub use station::{InvalidStationId, StationId};
pub use time::{TimeError, parse_timestamp};
