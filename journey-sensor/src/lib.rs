//! Journey sensors.
//!
//! Periodically fetches upcoming journeys between two stations from a
//! `db.transport.rest` API and exposes departure time, travel time and
//! number of legs as sensors.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod registry;
pub mod sensor;
pub mod settings;
pub mod stations;
pub mod transport;
pub mod web;

#[cfg(test)]
mod testing;
