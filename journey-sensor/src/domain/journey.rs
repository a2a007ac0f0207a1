//! Journey records.
//!
//! A `JourneyRecord` holds the scalar facts derived from one planned trip:
//! when it leaves, how long it takes and how many legs it has. Records are
//! rebuilt from scratch on every refresh and never mutated afterwards.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

/// Derived facts for one journey.
///
/// Fields are optional because the API may omit a departure or arrival
/// (e.g. for a cancelled leg with no planned time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyRecord {
    departure_time: Option<DateTime<FixedOffset>>,
    #[serde(serialize_with = "serialize_seconds")]
    travel_time: Option<Duration>,
    num_legs: Option<u32>,
}

impl JourneyRecord {
    /// Creates a record from explicit values.
    pub fn new(
        departure_time: Option<DateTime<FixedOffset>>,
        travel_time: Option<Duration>,
        num_legs: Option<u32>,
    ) -> Self {
        Self {
            departure_time,
            travel_time,
            num_legs,
        }
    }

    /// Derives a record from the first leg's departure and the last leg's
    /// arrival.
    ///
    /// Travel time is only known when both ends are.
    ///
    /// # Examples
    ///
    /// ```
    /// use journey_sensor::domain::{JourneyRecord, parse_timestamp};
    /// use chrono::Duration;
    ///
    /// let dep = parse_timestamp("2024-01-01T10:00:00").unwrap();
    /// let arr = parse_timestamp("2024-01-01T10:45:00").unwrap();
    ///
    /// let record = JourneyRecord::from_endpoints(Some(dep), Some(arr), 2);
    /// assert_eq!(record.travel_time(), Some(Duration::minutes(45)));
    /// assert_eq!(record.num_legs(), Some(2));
    /// ```
    pub fn from_endpoints(
        departure: Option<DateTime<FixedOffset>>,
        arrival: Option<DateTime<FixedOffset>>,
        num_legs: u32,
    ) -> Self {
        let travel_time = match (departure, arrival) {
            (Some(dep), Some(arr)) => Some(arr.signed_duration_since(dep)),
            _ => None,
        };

        Self {
            departure_time: departure,
            travel_time,
            num_legs: Some(num_legs),
        }
    }

    /// Departure time of the first leg.
    pub fn departure_time(&self) -> Option<DateTime<FixedOffset>> {
        self.departure_time
    }

    /// Time from first departure to last arrival.
    pub fn travel_time(&self) -> Option<Duration> {
        self.travel_time
    }

    /// Number of legs (vehicle segments).
    pub fn num_legs(&self) -> Option<u32> {
        self.num_legs
    }
}

fn serialize_seconds<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(d) => serializer.serialize_some(&d.num_seconds()),
        None => serializer.serialize_none(),
    }
}
