//! Conversion from transport DTOs to journey records.
//!
//! Each journey is reduced to its first leg's departure, its last leg's
//! arrival and its leg count. A single bad journey fails the whole
//! response: records are only ever published as a complete set.

use chrono::{DateTime, FixedOffset};

use crate::domain::{JourneyRecord, TimeError, parse_timestamp};

use super::types::{JourneyDto, JourneysResponse};

/// Error during DTO to record conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// The response has no `journeys` array
    #[error("missing required field: journeys")]
    MissingJourneys,

    /// A journey has no `legs` array
    #[error("journey {index}: missing required field: legs")]
    MissingLegs { index: usize },

    /// A journey has an empty `legs` array
    #[error("journey {index}: has no legs")]
    EmptyLegs { index: usize },

    /// A timestamp could not be parsed
    #[error("journey {index}: {source}")]
    InvalidTime {
        index: usize,
        #[source]
        source: TimeError,
    },
}

/// Convert a journeys response to records, preserving order.
pub fn convert_journeys(response: &JourneysResponse) -> Result<Vec<JourneyRecord>, ConversionError> {
    let journeys = response
        .journeys
        .as_deref()
        .ok_or(ConversionError::MissingJourneys)?;

    journeys
        .iter()
        .enumerate()
        .map(|(index, journey)| convert_journey(index, journey))
        .collect()
}

/// Convert a single journey.
pub fn convert_journey(index: usize, journey: &JourneyDto) -> Result<JourneyRecord, ConversionError> {
    let legs = journey
        .legs
        .as_deref()
        .ok_or(ConversionError::MissingLegs { index })?;

    let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
        return Err(ConversionError::EmptyLegs { index });
    };

    // Cancelled legs report a null prognosis; fall back to the timetable
    let departure = parse_optional(
        first
            .departure
            .as_deref()
            .or(first.planned_departure.as_deref()),
        index,
    )?;
    let arrival = parse_optional(
        last.arrival.as_deref().or(last.planned_arrival.as_deref()),
        index,
    )?;

    let num_legs = u32::try_from(legs.len()).unwrap_or(u32::MAX);

    Ok(JourneyRecord::from_endpoints(departure, arrival, num_legs))
}

fn parse_optional(
    value: Option<&str>,
    index: usize,
) -> Result<Option<DateTime<FixedOffset>>, ConversionError> {
    value
        .map(parse_timestamp)
        .transpose()
        .map_err(|source| ConversionError::InvalidTime { index, source })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::transport::types::LegDto;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    /// A journey as (start offset in minutes, per-leg (ride, wait) minutes).
    fn journey_strategy() -> impl Strategy<Value = (i64, Vec<(i64, i64)>)> {
        (0i64..10_000, prop::collection::vec((1i64..300, 0i64..60), 1..6))
    }

    fn build(start: i64, legs: &[(i64, i64)]) -> (JourneyDto, i64) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut t = start;
        let mut dtos = Vec::new();

        for (ride, wait) in legs {
            let dep = base + Duration::minutes(t);
            let arr = dep + Duration::minutes(*ride);
            dtos.push(LegDto {
                departure: Some(dep.to_rfc3339()),
                planned_departure: None,
                arrival: Some(arr.to_rfc3339()),
                planned_arrival: None,
            });
            t += ride + wait;
        }

        let (_, last_wait) = legs[legs.len() - 1];
        let total = t - last_wait - start;
        (JourneyDto { legs: Some(dtos) }, total)
    }

    proptest! {
        /// N journeys in, N records out, each with the right duration and leg count
        #[test]
        fn one_record_per_journey(journeys in prop::collection::vec(journey_strategy(), 0..8)) {
            let mut dtos = Vec::new();
            let mut expected = Vec::new();
            for (start, legs) in &journeys {
                let (dto, total) = build(*start, legs);
                dtos.push(dto);
                expected.push((total, legs.len() as u32));
            }

            let response = JourneysResponse { journeys: Some(dtos) };
            let records = convert_journeys(&response).unwrap();

            prop_assert_eq!(records.len(), journeys.len());
            for (record, (total, num_legs)) in records.iter().zip(expected) {
                prop_assert_eq!(record.travel_time(), Some(Duration::minutes(total)));
                prop_assert_eq!(record.num_legs(), Some(num_legs));
            }
        }
    }
}
