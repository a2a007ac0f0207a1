//! Scheduled journey refresh.
//!
//! A `JourneyCoordinator` owns the latest journeys for one origin and
//! destination pair. It refreshes them on a fixed interval, publishes each
//! new snapshot through a `watch` channel and keeps the previous journeys
//! when a refresh fails.
//!
//! There is exactly one writer per coordinator and snapshots are replaced
//! whole, so readers never observe a partially updated list.

mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::transport::{FetchError, JourneyQuery, TransportClient};

pub use state::CoordinatorState;

/// How often journeys are refreshed (5 minutes).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Refreshes and caches journeys for one configured pair.
pub struct JourneyCoordinator {
    /// Identifies this coordinator in logs (the entry id).
    name: String,
    client: TransportClient,
    query: JourneyQuery,
    update_interval: Duration,
    state: watch::Sender<CoordinatorState>,
    /// Serialises refreshes so a manual refresh never overlaps the timer.
    refresh_lock: Mutex<()>,
    /// Set while the last refresh failed, so failures are logged once.
    failing: AtomicBool,
}

impl JourneyCoordinator {
    /// Create a coordinator with an empty state.
    pub fn new(
        name: impl Into<String>,
        client: TransportClient,
        query: JourneyQuery,
        update_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(CoordinatorState::default());

        Self {
            name: name.into(),
            client,
            query,
            update_interval,
            state,
            refresh_lock: Mutex::new(()),
            failing: AtomicBool::new(false),
        }
    }

    /// Snapshot of the latest state.
    pub fn current(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified after every refresh attempt.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Fetch journeys now and publish the result.
    ///
    /// On success the journeys are replaced and the new state returned. On
    /// failure the previous journeys stay visible, the failure is recorded
    /// in the state and the error is returned.
    pub async fn refresh(&self) -> Result<CoordinatorState, FetchError> {
        let _guard = self.refresh_lock.lock().await;

        match self.client.journeys(&self.query).await {
            Ok(journeys) => {
                let count = journeys.len();
                let next = self.current().succeeded(journeys, Utc::now());
                self.state.send_replace(next.clone());

                if self.failing.swap(false, Ordering::Relaxed) {
                    info!(entry = %self.name, journeys = count, "journey refresh recovered");
                } else {
                    debug!(entry = %self.name, journeys = count, "journey refresh succeeded");
                }

                Ok(next)
            }
            Err(e) => {
                let next = self.current().failed(e.to_string(), Utc::now());
                self.state.send_replace(next);

                if self.failing.swap(true, Ordering::Relaxed) {
                    debug!(entry = %self.name, error = %e, "journey refresh still failing");
                } else {
                    error!(entry = %self.name, error = %e, "journey refresh failed");
                }

                Err(e)
            }
        }
    }

    /// Refresh every `update_interval` until `shutdown` turns true or its
    /// sender is dropped.
    ///
    /// The first refresh happens one interval after the call; callers run
    /// the initial refresh themselves.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.update_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // First tick is immediate, skip it

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = stopped(&mut shutdown) => break,
            }

            // An in-flight request is dropped on shutdown
            tokio::select! {
                // Failures are logged and recorded in the state
                _ = self.refresh() => {}
                _ = stopped(&mut shutdown) => break,
            }
        }

        debug!(entry = %self.name, "journey coordinator stopped");
    }
}

/// Resolves once `shutdown` is true or its sender is dropped.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
