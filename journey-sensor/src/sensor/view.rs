//! Sensor views over a coordinator.

use tokio::sync::watch;

use crate::coordinator::{CoordinatorState, JourneyCoordinator};

use super::descriptor::{SENSOR_TYPES, SensorDescriptor, SensorValue};

/// Failed refreshes in a row before sensors report unavailable.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// A read-only projection of one field of one journey.
///
/// Views subscribe to their coordinator; they never own or mutate its
/// state.
#[derive(Debug, Clone)]
pub struct SensorView {
    descriptor: &'static SensorDescriptor,
    index: usize,
    unique_id: String,
    name: String,
    device_name: String,
    failure_threshold: u32,
    state: watch::Receiver<CoordinatorState>,
}

impl SensorView {
    /// Create a view of `descriptor` for the journey at `index`.
    pub fn new(
        descriptor: &'static SensorDescriptor,
        index: usize,
        entry_id: &str,
        device_name: impl Into<String>,
        failure_threshold: u32,
        state: watch::Receiver<CoordinatorState>,
    ) -> Self {
        // Index 0 keeps the bare `{entry}-{key}` id
        let (unique_id, name) = if index == 0 {
            (
                format!("{entry_id}-{}", descriptor.key),
                descriptor.name.to_string(),
            )
        } else {
            (
                format!("{entry_id}-{}-{index}", descriptor.key),
                format!("{} {}", descriptor.name, index + 1),
            )
        };

        Self {
            descriptor,
            index,
            unique_id,
            name,
            device_name: device_name.into(),
            failure_threshold,
            state,
        }
    }

    pub fn descriptor(&self) -> &'static SensorDescriptor {
        self.descriptor
    }

    /// Which journey (0 = next) this view shows.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the device (station pair) this sensor belongs to.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The value for the latest coordinator state.
    ///
    /// `Unknown` when the latest result has fewer journeys than `index + 1`.
    pub fn current_value(&self) -> SensorValue {
        let state = self.state.borrow();
        project(self.descriptor, self.index, &state)
    }

    /// False once refreshes have failed `failure_threshold` times in a row.
    pub fn available(&self) -> bool {
        self.state.borrow().consecutive_failures() < self.failure_threshold
    }

    /// Wait for the next coordinator update and return the new value.
    ///
    /// Returns `None` once the coordinator has been dropped.
    pub async fn changed(&mut self) -> Option<SensorValue> {
        self.state.changed().await.ok()?;
        let state = self.state.borrow_and_update();
        Some(project(self.descriptor, self.index, &state))
    }
}

fn project(descriptor: &SensorDescriptor, index: usize, state: &CoordinatorState) -> SensorValue {
    state
        .journey(index)
        .map_or(SensorValue::Unknown, |journey| (descriptor.value_fn)(journey))
}

/// Build every view for an entry: each descriptor for each of the first
/// `max_journeys` journeys, grouped by journey.
pub fn build_views(
    coordinator: &JourneyCoordinator,
    entry_id: &str,
    device_name: &str,
    max_journeys: usize,
    failure_threshold: u32,
) -> Vec<SensorView> {
    (0..max_journeys)
        .flat_map(|index| {
            SENSOR_TYPES.iter().map(move |descriptor| {
                SensorView::new(
                    descriptor,
                    index,
                    entry_id,
                    device_name,
                    failure_threshold,
                    coordinator.subscribe(),
                )
            })
        })
        .collect()
}
