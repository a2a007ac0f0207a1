//! Application state for the web layer.

use std::sync::Arc;

use crate::config::SetupFlow;
use crate::registry::EntryRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Running config entries
    pub registry: Arc<EntryRegistry>,

    /// Validates hosts and builds new entries
    pub setup: SetupFlow,
}

impl AppState {
    /// Create a new app state.
    pub fn new(registry: Arc<EntryRegistry>, setup: SetupFlow) -> Self {
        Self { registry, setup }
    }
}
