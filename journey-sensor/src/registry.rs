//! Config entry lifecycle.
//!
//! The registry owns every running entry: its coordinator, the task that
//! drives it and the sensor views built on it. Entries are set up from
//! the store at startup, added by the setup flow, reloaded when their
//! options change and unloaded when removed.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ConfigError, EntryConfig, EntryOptions, EntryStore};
use crate::coordinator::{CoordinatorState, JourneyCoordinator};
use crate::sensor::{SensorView, build_views};
use crate::stations::StationNames;
use crate::transport::{FetchError, JourneyQuery, TransportClient};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No entry with this id
    #[error("no entry with id {0}")]
    NotFound(String),

    /// An entry for the same pair on the same host exists
    #[error("already configured as entry {0}")]
    AlreadyConfigured(String),

    /// Options out of bounds
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Persisting entries failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A manual refresh failed
    #[error("refresh failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Settings shared by every entry.
#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    pub update_interval: Duration,
    pub failure_threshold: u32,
}

/// A set-up entry.
struct RunningEntry {
    config: EntryConfig,
    device_name: String,
    coordinator: Arc<JourneyCoordinator>,
    sensors: Vec<SensorView>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Read-only view of one entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    pub config: EntryConfig,
    pub device_name: String,
    pub state: CoordinatorState,
}

/// All running entries.
pub struct EntryRegistry {
    http: reqwest::Client,
    names: StationNames,
    store: EntryStore,
    settings: RegistrySettings,
    entries: RwLock<BTreeMap<String, RunningEntry>>,
    /// Held across every change to the set of entries, including the save.
    lifecycle: Mutex<()>,
}

impl EntryRegistry {
    /// Create an empty registry.
    ///
    /// `http` is shared by every entry's transport client.
    pub fn new(http: reqwest::Client, store: EntryStore, settings: RegistrySettings) -> Self {
        Self {
            http,
            names: StationNames::new(),
            store,
            settings,
            entries: RwLock::new(BTreeMap::new()),
            lifecycle: Mutex::new(()),
        }
    }

    /// Set up stored entries concurrently. Does not persist.
    ///
    /// Ids that are already running, or repeated in `configs`, are skipped.
    pub async fn setup_all(&self, configs: Vec<EntryConfig>) {
        let _lifecycle = self.lifecycle.lock().await;

        let mut seen: BTreeSet<String> = self.entries.read().await.keys().cloned().collect();
        let configs: Vec<EntryConfig> = configs
            .into_iter()
            .filter(|config| {
                let fresh = seen.insert(config.entry_id.clone());
                if !fresh {
                    warn!(entry = %config.entry_id, "skipping duplicate entry id");
                }
                fresh
            })
            .collect();

        let running = join_all(configs.into_iter().map(|config| self.setup(config))).await;

        let mut entries = self.entries.write().await;
        for entry in running {
            entries.insert(entry.config.entry_id.clone(), entry);
        }
    }

    /// Add a new entry from the setup flow, persist it and set it up.
    pub async fn add(&self, config: EntryConfig) -> Result<EntrySnapshot, RegistryError> {
        config
            .options
            .validate()
            .map_err(RegistryError::InvalidOptions)?;

        let _lifecycle = self.lifecycle.lock().await;

        let mut configs = self.configs().await;
        if let Some(existing) = configs.iter().find(|c| c.same_pair(&config.data)) {
            return Err(RegistryError::AlreadyConfigured(existing.entry_id.clone()));
        }
        configs.push(config.clone());
        self.store.save(&configs)?;

        let running = self.setup(config).await;
        let snapshot = snapshot(&running);
        self.entries
            .write()
            .await
            .insert(running.config.entry_id.clone(), running);

        Ok(snapshot)
    }

    /// Remove an entry from the store and unload it.
    pub async fn remove(&self, entry_id: &str) -> Result<(), RegistryError> {
        let _lifecycle = self.lifecycle.lock().await;

        let mut configs = self.configs().await;
        let before = configs.len();
        configs.retain(|c| c.entry_id != entry_id);
        if configs.len() == before {
            return Err(RegistryError::NotFound(entry_id.to_string()));
        }
        self.store.save(&configs)?;

        let running = self.entries.write().await.remove(entry_id);
        if let Some(running) = running {
            unload(running).await;
        }
        Ok(())
    }

    /// Change an entry's options; the entry is persisted and reloaded.
    pub async fn update_options(
        &self,
        entry_id: &str,
        options: EntryOptions,
    ) -> Result<EntrySnapshot, RegistryError> {
        options.validate().map_err(RegistryError::InvalidOptions)?;

        let _lifecycle = self.lifecycle.lock().await;

        let mut configs = self.configs().await;
        let config = configs
            .iter_mut()
            .find(|c| c.entry_id == entry_id)
            .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;
        config.options = options;
        let config = config.clone();
        self.store.save(&configs)?;

        self.reload_with(config).await
    }

    /// Unload and set up an entry again with its current config.
    pub async fn reload(&self, entry_id: &str) -> Result<EntrySnapshot, RegistryError> {
        let _lifecycle = self.lifecycle.lock().await;

        let config = self
            .entries
            .read()
            .await
            .get(entry_id)
            .map(|e| e.config.clone())
            .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;
        self.reload_with(config).await
    }

    /// Refresh an entry now, outside its schedule.
    pub async fn refresh(&self, entry_id: &str) -> Result<CoordinatorState, RegistryError> {
        let coordinator = {
            let entries = self.entries.read().await;
            let entry = entries
                .get(entry_id)
                .ok_or_else(|| RegistryError::NotFound(entry_id.to_string()))?;
            Arc::clone(&entry.coordinator)
        };

        Ok(coordinator.refresh().await?)
    }

    /// Snapshots of every entry, ordered by id.
    pub async fn entries(&self) -> Vec<EntrySnapshot> {
        self.entries.read().await.values().map(snapshot).collect()
    }

    /// Snapshot of one entry.
    pub async fn entry(&self, entry_id: &str) -> Option<EntrySnapshot> {
        self.entries.read().await.get(entry_id).map(snapshot)
    }

    /// Every sensor of every entry.
    pub async fn sensors(&self) -> Vec<SensorView> {
        self.entries
            .read()
            .await
            .values()
            .flat_map(|e| e.sensors.iter().cloned())
            .collect()
    }

    /// Unload every entry without touching the store.
    pub async fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let running: Vec<RunningEntry> = {
            let mut entries = self.entries.write().await;
            std::mem::take(&mut *entries).into_values().collect()
        };

        join_all(running.into_iter().map(unload)).await;
    }

    /// Configs of every running entry, ordered by id.
    async fn configs(&self) -> Vec<EntryConfig> {
        self.entries
            .read()
            .await
            .values()
            .map(|e| e.config.clone())
            .collect()
    }

    /// Caller holds `lifecycle`.
    async fn reload_with(&self, config: EntryConfig) -> Result<EntrySnapshot, RegistryError> {
        let entry_id = config.entry_id.clone();

        let old = self
            .entries
            .write()
            .await
            .remove(&entry_id)
            .ok_or_else(|| RegistryError::NotFound(entry_id.clone()))?;
        unload(old).await;

        let running = self.setup(config).await;
        let snapshot = snapshot(&running);
        self.entries.write().await.insert(entry_id, running);

        Ok(snapshot)
    }

    /// Build and start an entry.
    ///
    /// A failed first refresh does not stop setup: the entry starts with
    /// no journeys and the schedule keeps retrying.
    async fn setup(&self, config: EntryConfig) -> RunningEntry {
        let data = &config.data;
        let client = TransportClient::with_http(self.http.clone(), data.host.clone());
        let query = JourneyQuery::new(data.from_station_id.clone(), data.to_station_id.clone());

        let coordinator = Arc::new(JourneyCoordinator::new(
            config.entry_id.clone(),
            client.clone(),
            query,
            self.settings.update_interval,
        ));

        let (first_refresh, device_name) = futures::join!(
            coordinator.refresh(),
            self.names
                .pair_name(&client, &data.from_station_id, &data.to_station_id)
        );

        if let Err(e) = first_refresh {
            warn!(entry = %config.entry_id, error = %e, "first refresh failed, will retry on schedule");
        }

        let sensors = build_views(
            &coordinator,
            &config.entry_id,
            &device_name,
            config.options.max_journeys,
            self.settings.failure_threshold,
        );

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.run(shutdown_rx).await })
        };

        info!(
            entry = %config.entry_id,
            title = %config.title,
            device = %device_name,
            sensors = sensors.len(),
            "entry set up"
        );

        RunningEntry {
            config,
            device_name,
            coordinator,
            sensors,
            shutdown,
            task,
        }
    }
}

fn snapshot(entry: &RunningEntry) -> EntrySnapshot {
    EntrySnapshot {
        config: entry.config.clone(),
        device_name: entry.device_name.clone(),
        state: entry.coordinator.current(),
    }
}

/// Stop an entry's task and wait for it to finish.
async fn unload(entry: RunningEntry) {
    let entry_id = entry.config.entry_id;
    let _ = entry.shutdown.send(true);

    if let Err(e) = entry.task.await {
        warn!(entry = %entry_id, error = %e, "coordinator task ended abnormally");
    }

    info!(entry = %entry_id, "entry unloaded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntryData;
    use crate::domain::StationId;
    use crate::sensor::SensorValue;
    use crate::testing::{FakeApi, journeys_body};
    use tempfile::{TempDir, tempdir};

    const SETTINGS: RegistrySettings = RegistrySettings {
        update_interval: Duration::from_secs(300),
        failure_threshold: 3,
    };

    async fn fixture() -> (FakeApi, String, EntryRegistry, TempDir) {
        let api = FakeApi::new();
        api.add_station("8000105", "Frankfurt(Main)Hbf");
        api.add_station("8000191", "Karlsruhe Hbf");
        api.set_journeys(
            200,
            journeys_body(&[
                ("2024-01-01T10:00:00", "2024-01-01T10:45:00", 2),
                ("2024-01-01T11:00:00", "2024-01-01T12:00:00", 3),
            ]),
        );
        let host = api.serve().await;

        let dir = tempdir().unwrap();
        let store = EntryStore::new(dir.path().join("entries.json"));
        let registry = EntryRegistry::new(reqwest::Client::new(), store, SETTINGS);

        (api, host, registry, dir)
    }

    fn config(host: &str, max_journeys: usize) -> EntryConfig {
        EntryConfig::new(
            "Frankfurt(Main)Hbf <> Karlsruhe Hbf",
            EntryData {
                host: host.to_string(),
                from_station_id: StationId::parse("8000105").unwrap(),
                to_station_id: StationId::parse("8000191").unwrap(),
            },
            EntryOptions { max_journeys },
        )
    }

    #[tokio::test]
    async fn add_sets_up_and_persists() {
        let (_api, host, registry, dir) = fixture().await;

        let snapshot = registry.add(config(&host, 1)).await.unwrap();
        assert_eq!(snapshot.device_name, "Frankfurt(Main)Hbf => Karlsruhe Hbf");
        assert_eq!(snapshot.state.journeys().len(), 2);

        let sensors = registry.sensors().await;
        assert_eq!(sensors.len(), 3);
        let legs = sensors
            .iter()
            .find(|s| s.descriptor().key == "num_legs")
            .unwrap();
        assert_eq!(legs.current_value(), SensorValue::Integer(2));

        let stored = EntryStore::new(dir.path().join("entries.json")).load().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].entry_id, snapshot.config.entry_id);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected() {
        let (_api, host, registry, _dir) = fixture().await;

        let first = registry.add(config(&host, 1)).await.unwrap();
        let err = registry.add(config(&host, 2)).await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyConfigured(id) if id == first.config.entry_id));

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn failed_first_refresh_still_sets_up() {
        let (api, host, registry, _dir) = fixture().await;
        api.set_journeys(500, "down");

        let snapshot = registry.add(config(&host, 1)).await.unwrap();
        assert!(snapshot.state.journeys().is_empty());
        assert_eq!(snapshot.state.consecutive_failures(), 1);

        let sensors = registry.sensors().await;
        assert!(sensors.iter().all(|s| s.current_value().is_unknown()));
        assert!(sensors.iter().all(|s| s.available()));

        api.set_journeys(
            200,
            journeys_body(&[("2024-01-01T10:00:00", "2024-01-01T10:45:00", 2)]),
        );
        let state = registry.refresh(&snapshot.config.entry_id).await.unwrap();
        assert_eq!(state.journeys().len(), 1);
        assert!(!sensors[0].current_value().is_unknown());

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn update_options_reloads_with_more_sensors() {
        let (_api, host, registry, dir) = fixture().await;
        let entry_id = registry.add(config(&host, 1)).await.unwrap().config.entry_id;

        registry
            .update_options(&entry_id, EntryOptions { max_journeys: 2 })
            .await
            .unwrap();

        let sensors = registry.sensors().await;
        assert_eq!(sensors.len(), 6);
        let second_legs = sensors
            .iter()
            .find(|s| s.unique_id() == format!("{entry_id}-num_legs-1"))
            .unwrap();
        assert_eq!(second_legs.current_value(), SensorValue::Integer(3));

        let stored = EntryStore::new(dir.path().join("entries.json")).load().unwrap();
        assert_eq!(stored[0].options.max_journeys, 2);

        let err = registry
            .update_options(&entry_id, EntryOptions { max_journeys: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidOptions(_)));

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn remove_unloads_and_persists() {
        let (_api, host, registry, dir) = fixture().await;
        let entry_id = registry.add(config(&host, 1)).await.unwrap().config.entry_id;

        registry.remove(&entry_id).await.unwrap();
        assert!(registry.entries().await.is_empty());
        assert!(registry.sensors().await.is_empty());

        let stored = EntryStore::new(dir.path().join("entries.json")).load().unwrap();
        assert!(stored.is_empty());

        let err = registry.remove(&entry_id).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn setup_all_sets_up_every_entry() {
        let (api, host, registry, _dir) = fixture().await;

        let mut other = config(&host, 1);
        other.data.to_station_id = StationId::parse("8000105").unwrap();
        registry.setup_all(vec![config(&host, 1), other]).await;

        assert_eq!(registry.entries().await.len(), 2);
        assert_eq!(api.journey_queries().len(), 2);

        registry.shutdown().await;
        assert!(registry.entries().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_all_persisted() {
        let (_api, host, registry, dir) = fixture().await;
        let registry = Arc::new(registry);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let mut config = config(&host, 1);
                config.data.to_station_id = StationId::parse(&format!("90000{i}")).unwrap();
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.add(config).await })
            })
            .collect();

        for result in join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        let running: BTreeSet<String> = registry
            .entries()
            .await
            .into_iter()
            .map(|e| e.config.entry_id)
            .collect();
        let stored: BTreeSet<String> = EntryStore::new(dir.path().join("entries.json"))
            .load()
            .unwrap()
            .into_iter()
            .map(|e| e.entry_id)
            .collect();

        assert_eq!(running.len(), 8);
        assert_eq!(stored, running);

        registry.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_duplicate_add_keeps_one_entry() {
        let (api, host, registry, _dir) = fixture().await;

        let (a, b) = tokio::join!(
            registry.add(config(&host, 1)),
            registry.add(config(&host, 1))
        );

        assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
        assert!(matches!(
            a.err().or(b.err()),
            Some(RegistryError::AlreadyConfigured(_))
        ));
        assert_eq!(registry.entries().await.len(), 1);
        assert_eq!(api.journey_queries().len(), 1);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn failed_save_leaves_nothing_running() {
        let (api, host, _registry, dir) = fixture().await;

        // A directory where the store file should be makes the rename fail
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        let store = EntryStore::new(&path);
        let registry = EntryRegistry::new(reqwest::Client::new(), store, SETTINGS);

        let err = registry.add(config(&host, 1)).await.unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
        assert!(registry.entries().await.is_empty());
        assert!(api.journey_queries().is_empty());
    }

    #[tokio::test]
    async fn setup_all_skips_duplicate_ids() {
        let (api, host, registry, _dir) = fixture().await;

        let first = config(&host, 1);
        let mut copy = first.clone();
        copy.options.max_journeys = 2;
        registry.setup_all(vec![first.clone(), copy]).await;

        assert_eq!(registry.entries().await.len(), 1);
        assert_eq!(registry.sensors().await.len(), 3);

        registry.setup_all(vec![first]).await;
        assert_eq!(registry.entries().await.len(), 1);
        assert_eq!(api.journey_queries().len(), 1);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_entry_operations_fail() {
        let (_api, _host, registry, _dir) = fixture().await;

        assert!(matches!(
            registry.refresh("missing").await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.reload("missing").await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(registry.entry("missing").await.is_none());
    }
}
