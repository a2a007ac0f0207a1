//! Journey sensors.
//!
//! A fixed table of descriptors says which fields are exposed and how each
//! is projected from a `JourneyRecord`. Views pair a descriptor with a
//! journey index and read from a coordinator subscription.

mod descriptor;
mod view;

pub use descriptor::{DeviceClass, SENSOR_TYPES, SensorDescriptor, SensorValue, descriptor};
pub use view::{DEFAULT_FAILURE_THRESHOLD, SensorView, build_views};
