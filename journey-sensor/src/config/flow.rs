//! Setup flow for new config entries.
//!
//! Setting up an entry takes two steps:
//! 1. the user names a host; we check it answers `GET /stations` with a
//!    valid directory;
//! 2. the user picks origin and destination by name; we resolve them to
//!    ids and produce an `EntryConfig`.

use tracing::error;

use crate::stations::StationDirectory;
use crate::transport::{FetchError, TransportClient};

use super::entry::{EntryConfig, EntryData, EntryOptions};

/// Errors shown to the user during setup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Host is not an http(s) URL
    #[error("invalid host {0:?}: expected an http:// or https:// URL")]
    InvalidHost(String),

    /// Host answered `GET /stations` with a status other than 200
    #[error("cannot connect to {host}: {source}")]
    CannotConnect {
        host: String,
        #[source]
        source: FetchError,
    },

    /// Station name is not in the host's directory
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// Invalid options
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Anything else: unreachable host, timeout, or a directory that does
    /// not match the schema
    #[error("unexpected error validating {host}: {source}")]
    Unknown {
        host: String,
        #[source]
        source: FetchError,
    },
}

impl SetupError {
    /// Stable error code for user interfaces.
    pub fn code(&self) -> &'static str {
        match self {
            SetupError::InvalidHost(_) => "invalid_host",
            SetupError::CannotConnect { .. } => "cannot_connect",
            SetupError::UnknownStation(_) => "unknown_station",
            SetupError::InvalidOptions(_) => "invalid_options",
            SetupError::Unknown { .. } => "unknown",
        }
    }
}

/// Runs the setup steps against a user-supplied host.
#[derive(Debug, Clone)]
pub struct SetupFlow {
    http: reqwest::Client,
}

impl SetupFlow {
    /// Create a flow that makes requests with `http`.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Step 1: check the host is reachable and serves a station directory.
    pub async fn validate_host(&self, host: &str) -> Result<StationDirectory, SetupError> {
        let host = normalize_host(host)?;
        let client = TransportClient::with_http(self.http.clone(), host.clone());

        match client.stations().await {
            Ok(stations) => Ok(StationDirectory::from_stations(stations)),
            Err(source @ FetchError::Http { .. }) => {
                Err(SetupError::CannotConnect { host, source })
            }
            Err(source) => {
                error!(host = %host, error = ?source, "unexpected error validating host");
                Err(SetupError::Unknown { host, source })
            }
        }
    }

    /// Steps 1 and 2 in one go.
    pub async fn create_entry(
        &self,
        host: &str,
        from_name: &str,
        to_name: &str,
        options: EntryOptions,
    ) -> Result<EntryConfig, SetupError> {
        let directory = self.validate_host(host).await?;
        entry_from_directory(&directory, host, from_name, to_name, options)
    }
}

/// Step 2: resolve station names and build the entry.
pub fn entry_from_directory(
    directory: &StationDirectory,
    host: &str,
    from_name: &str,
    to_name: &str,
    options: EntryOptions,
) -> Result<EntryConfig, SetupError> {
    let host = normalize_host(host)?;
    options.validate().map_err(SetupError::InvalidOptions)?;

    let from = directory
        .resolve(from_name)
        .ok_or_else(|| SetupError::UnknownStation(from_name.to_string()))?;
    let to = directory
        .resolve(to_name)
        .ok_or_else(|| SetupError::UnknownStation(to_name.to_string()))?;

    let data = EntryData {
        host,
        from_station_id: from.clone(),
        to_station_id: to.clone(),
    };

    Ok(EntryConfig::new(
        format!("{from_name} <> {to_name}"),
        data,
        options,
    ))
}

/// Trim whitespace and trailing slashes; require an http(s) scheme.
fn normalize_host(host: &str) -> Result<String, SetupError> {
    let host = host.trim().trim_end_matches('/');

    let has_scheme = host
        .strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());

    if !has_scheme {
        return Err(SetupError::InvalidHost(host.to_string()));
    }

    Ok(host.to_string())
}
