//! Runtime settings, read from environment variables.
//!
//! | Variable                       | Default                 |
//! |--------------------------------|-------------------------|
//! | `JOURNEY_CONFIG`               | `journey_entries.json`  |
//! | `JOURNEY_LISTEN_ADDR`          | `127.0.0.1:3000`        |
//! | `JOURNEY_UPDATE_INTERVAL_SECS` | `300`                   |
//! | `JOURNEY_HTTP_TIMEOUT_SECS`    | `30`                    |
//! | `JOURNEY_FAILURE_THRESHOLD`    | `3`                     |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DEFAULT_STORE_PATH;
use crate::coordinator::DEFAULT_UPDATE_INTERVAL;
use crate::sensor::DEFAULT_FAILURE_THRESHOLD;

/// Error for an environment variable that is set but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {name}: {reason}")]
pub struct SettingsError {
    name: &'static str,
    value: String,
    reason: String,
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where config entries are stored
    pub config_path: PathBuf,
    /// Address the HTTP API listens on
    pub listen_addr: SocketAddr,
    /// Time between journey refreshes
    pub update_interval: Duration,
    /// Timeout for each HTTP request to a transport API
    pub http_timeout_secs: u64,
    /// Failed refreshes in a row before sensors become unavailable
    pub failure_threshold: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_STORE_PATH),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            http_timeout_secs: 30,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset
    /// variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();

        let config_path = lookup("JOURNEY_CONFIG")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.config_path);

        let listen_addr = parse_var(&lookup, "JOURNEY_LISTEN_ADDR")?.unwrap_or(defaults.listen_addr);

        let update_interval = parse_var::<u64>(&lookup, "JOURNEY_UPDATE_INTERVAL_SECS")?
            .map(|secs| positive("JOURNEY_UPDATE_INTERVAL_SECS", secs))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.update_interval);

        let http_timeout_secs = parse_var::<u64>(&lookup, "JOURNEY_HTTP_TIMEOUT_SECS")?
            .map(|secs| positive("JOURNEY_HTTP_TIMEOUT_SECS", secs))
            .transpose()?
            .unwrap_or(defaults.http_timeout_secs);

        let failure_threshold = parse_var::<u32>(&lookup, "JOURNEY_FAILURE_THRESHOLD")?
            .map(|n| positive("JOURNEY_FAILURE_THRESHOLD", n))
            .transpose()?
            .unwrap_or(defaults.failure_threshold);

        Ok(Self {
            config_path,
            listen_addr,
            update_interval,
            http_timeout_secs,
            failure_threshold,
        })
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| SettingsError {
            name,
            reason: e.to_string(),
            value,
        })
}

fn positive<T>(name: &'static str, n: T) -> Result<T, SettingsError>
where
    T: Copy + PartialEq + Default + std::fmt::Display,
{
    if n == T::default() {
        return Err(SettingsError {
            name,
            value: n.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(n)
}
