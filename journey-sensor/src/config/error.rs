//! Configuration error types.

use std::path::PathBuf;

use super::entry::CURRENT_VERSION;

/// Errors from loading, migrating or saving config entries.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the entry store failed
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the entry store failed
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The entry store is not valid JSON of the expected shape
    #[error("invalid entry store {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An entry's data is missing fields or has invalid values
    #[error("entry {entry_id}: {message}")]
    InvalidEntry { entry_id: String, message: String },

    /// An entry was written by a newer version of this program
    #[error(
        "entry {entry_id}: version {version} is newer than supported version {}",
        CURRENT_VERSION
    )]
    Downgrade { entry_id: String, version: u32 },
}
