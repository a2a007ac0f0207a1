//! Web layer for the journey sensors.
//!
//! Provides a JSON API for setting up config entries and reading sensors.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
