//! Disk-based store for config entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::entry::{EntryConfig, StoredEntry, migrate};
use super::error::ConfigError;

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "journey_entries.json";

/// On-disk layout when reading.
#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    entries: Vec<StoredEntry>,
}

/// On-disk layout when writing.
#[derive(Debug, Serialize)]
struct StoreFileRef<'a> {
    entries: &'a [EntryConfig],
}

/// JSON file holding every config entry.
#[derive(Debug, Clone)]
pub struct EntryStore {
    path: PathBuf,
}

impl EntryStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load and migrate all entries.
    ///
    /// A missing file is an empty store. If any entry needed migrating,
    /// the migrated entries are written back before returning.
    pub fn load(&self) -> Result<Vec<EntryConfig>, ConfigError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let file: StoreFile =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let mut entries = Vec::with_capacity(file.entries.len());
        let mut any_migrated = false;

        for stored in file.entries {
            let (entry, migrated) = migrate(stored)?;
            any_migrated |= migrated;
            entries.push(entry);
        }

        if any_migrated {
            self.save(&entries)?;
            info!(path = %self.path.display(), "saved migrated config entries");
        }

        Ok(entries)
    }

    /// Save entries, replacing the file.
    ///
    /// Creates parent directories if they don't exist. The file is written
    /// next to its destination and renamed over it, so readers never see a
    /// half-written store.
    pub fn save(&self, entries: &[EntryConfig]) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(&StoreFileRef { entries })
            .map_err(|e| write_err(std::io::Error::other(e)))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        Ok(())
    }

    /// Get the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for EntryStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntryData, EntryOptions};
    use crate::domain::StationId;
    use tempfile::tempdir;

    fn entry(from: &str, to: &str) -> EntryConfig {
        EntryConfig::new(
            format!("{from} <> {to}"),
            EntryData {
                host: "http://localhost:3000".into(),
                from_station_id: StationId::parse(from).unwrap(),
                to_station_id: StationId::parse(to).unwrap(),
            },
            EntryOptions::default(),
        )
    }

    #[test]
    fn save_and_load() {
        let dir = tempdir().unwrap();
        let store = EntryStore::new(dir.path().join("entries.json"));

        let entries = vec![entry("1", "2"), entry("3", "4")];
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = EntryStore::new(dir.path().join("nope.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("dir").join("entries.json");
        let store = EntryStore::new(&path);

        store.save(&[entry("1", "2")]).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = EntryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn legacy_entries_are_migrated_and_written_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(
            &path,
            r#"{"entries": [{"entry_id": "old", "version": 1, "minor_version": 1,
                "title": "A <> B",
                "data": {"host": "http://localhost:3000", "source": "1", "target": "2"}}]}"#,
        )
        .unwrap();

        let store = EntryStore::new(&path);
        let loaded = store.load().unwrap();
        assert_eq!(loaded[0].data.from_station_id.as_str(), "1");
        assert_eq!(loaded[0].minor_version, 2);

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["entries"][0]["minor_version"], 2);
        assert_eq!(on_disk["entries"][0]["data"]["from"], "1");
        assert_eq!(on_disk["entries"][0]["data"]["to"], "2");
    }

    #[test]
    fn downgrade_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(
            &path,
            r#"{"entries": [{"entry_id": "new", "version": 2, "minor_version": 0,
                "data": {"host": "h", "from": "1", "to": "2"}}]}"#,
        )
        .unwrap();

        let err = EntryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Downgrade { .. }));
    }
}
