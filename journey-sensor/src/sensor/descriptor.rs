//! Sensor descriptors and values.

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;

use crate::domain::JourneyRecord;

/// What kind of quantity a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Timestamp,
    Duration,
    DataSize,
}

/// The value a sensor displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Timestamp(DateTime<FixedOffset>),
    Integer(i64),
    /// No journey at this index, or the field is missing.
    Unknown,
}

impl SensorValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, SensorValue::Unknown)
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Timestamp(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            SensorValue::Integer(n) => write!(f, "{n}"),
            SensorValue::Unknown => f.write_str("unknown"),
        }
    }
}

/// Describes one kind of journey sensor.
#[derive(Debug)]
pub struct SensorDescriptor {
    /// Stable key, part of the sensor's unique id.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub device_class: DeviceClass,
    pub unit: Option<&'static str>,
    /// Projects a journey into the displayed value.
    pub value_fn: fn(&JourneyRecord) -> SensorValue,
}

/// Every sensor created per journey.
pub static SENSOR_TYPES: [SensorDescriptor; 3] = [
    SensorDescriptor {
        key: "departure_time",
        name: "Departure time",
        icon: Some("mdi:clock"),
        device_class: DeviceClass::Timestamp,
        unit: None,
        value_fn: departure_time,
    },
    SensorDescriptor {
        key: "travel_time",
        name: "Travel time",
        icon: Some("mdi:clock"),
        device_class: DeviceClass::Duration,
        unit: Some("s"),
        value_fn: travel_time,
    },
    SensorDescriptor {
        key: "num_legs",
        name: "Number of legs",
        icon: None,
        device_class: DeviceClass::DataSize,
        unit: None,
        value_fn: num_legs,
    },
];

/// Find a descriptor by key.
pub fn descriptor(key: &str) -> Option<&'static SensorDescriptor> {
    SENSOR_TYPES.iter().find(|d| d.key == key)
}

fn departure_time(journey: &JourneyRecord) -> SensorValue {
    journey
        .departure_time()
        .map_or(SensorValue::Unknown, SensorValue::Timestamp)
}

fn travel_time(journey: &JourneyRecord) -> SensorValue {
    journey
        .travel_time()
        .map_or(SensorValue::Unknown, |d| SensorValue::Integer(d.num_seconds()))
}

fn num_legs(journey: &JourneyRecord) -> SensorValue {
    journey
        .num_legs()
        .map_or(SensorValue::Unknown, |n| SensorValue::Integer(i64::from(n)))
}
