//! Station names and directory.
//!
//! Provides station id → display name lookup for sensor devices, and the
//! validated station directory used to resolve names during setup.

mod directory;
mod names;

pub use directory::StationDirectory;
pub use names::StationNames;
