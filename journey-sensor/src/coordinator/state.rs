//! Coordinator state snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::JourneyRecord;

/// The latest result of a coordinator, as seen by its subscribers.
///
/// Snapshots are cheap to clone: the journey list is shared. A new
/// snapshot is built for every refresh attempt; `journeys` is either the
/// complete new list or the previous list untouched.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    journeys: Arc<Vec<JourneyRecord>>,
    last_refresh: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    last_error: Option<String>,
    consecutive_failures: u32,
}

impl CoordinatorState {
    /// Journeys from the last successful refresh, earliest first.
    pub fn journeys(&self) -> &[JourneyRecord] {
        &self.journeys
    }

    /// The journey at `index`, if the last result had that many.
    pub fn journey(&self, index: usize) -> Option<&JourneyRecord> {
        self.journeys.get(index)
    }

    /// When the last successful refresh completed.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// When the last failed refresh completed.
    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        self.last_failure
    }

    /// Error message of the last refresh, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of failed refreshes since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the most recent refresh attempt succeeded.
    pub fn last_refresh_succeeded(&self) -> bool {
        self.last_refresh.is_some() && self.consecutive_failures == 0
    }

    /// State after a successful refresh.
    pub(crate) fn succeeded(&self, journeys: Vec<JourneyRecord>, at: DateTime<Utc>) -> Self {
        Self {
            journeys: Arc::new(journeys),
            last_refresh: Some(at),
            last_failure: self.last_failure,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    /// State after a failed refresh; journeys are carried over.
    pub(crate) fn failed(&self, error: String, at: DateTime<Utc>) -> Self {
        Self {
            journeys: Arc::clone(&self.journeys),
            last_refresh: self.last_refresh,
            last_failure: Some(at),
            last_error: Some(error),
            consecutive_failures: self.consecutive_failures.saturating_add(1),
        }
    }
}
