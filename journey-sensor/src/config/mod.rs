//! Config entries: persistence, migration and the setup flow.
//!
//! A config entry holds exactly what a coordinator needs: the API host and
//! the origin and destination station ids, plus user options.

mod entry;
mod error;
mod flow;
mod store;

pub use entry::{
    CURRENT_MINOR_VERSION, CURRENT_VERSION, EntryConfig, EntryData, EntryOptions, MAX_JOURNEYS,
    StoredEntry, migrate,
};
pub use error::ConfigError;
pub use flow::{SetupError, SetupFlow, entry_from_directory};
pub use store::{DEFAULT_STORE_PATH, EntryStore};
