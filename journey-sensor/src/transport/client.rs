//! Transport REST API HTTP client.
//!
//! Provides async methods for querying journeys and stations and converts
//! responses to domain types.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::domain::{JourneyRecord, StationId};

use super::convert::convert_journeys;
use super::error::FetchError;
use super::types::{JourneysResponse, StationDto, StationNameDto};

/// Default base URL for the transport API.
pub const DEFAULT_BASE_URL: &str = "https://v6.db.transport.rest";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the transport client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base URL for the API (defaults to the public instance)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransportConfig {
    /// Create a new config for the given host.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Build the underlying HTTP client.
    pub fn build_http(&self) -> Result<reqwest::Client, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(concat!("journey-sensor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(http)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Query parameters for `GET /journeys`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyQuery {
    pub from: StationId,
    pub to: StationId,
    /// Include national (IC/EC) services
    pub national: bool,
    /// Include national express (ICE) services
    pub national_express: bool,
}

impl JourneyQuery {
    /// National services only, express excluded.
    pub fn new(from: StationId, to: StationId) -> Self {
        Self {
            from,
            to,
            national: true,
            national_express: false,
        }
    }

    fn params(&self) -> [(&'static str, String); 4] {
        [
            ("from", self.from.to_string()),
            ("to", self.to.to_string()),
            ("nationalExpress", self.national_express.to_string()),
            ("national", self.national.to_string()),
        ]
    }
}

/// Transport API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransportClient {
    /// Create a new client with its own HTTP connection pool.
    pub fn new(config: TransportConfig) -> Result<Self, FetchError> {
        let http = config.build_http()?;
        Ok(Self::with_http(http, config.base_url))
    }

    /// Create a client for `base_url` on a shared HTTP client.
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// The host this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch upcoming journeys and derive one record per journey.
    pub async fn journeys(&self, query: &JourneyQuery) -> Result<Vec<JourneyRecord>, FetchError> {
        let url = format!("{}/journeys", self.base_url);

        let response = self.http.get(&url).query(&query.params()).send().await?;
        let body = success_body(response).await?;

        let parsed: JourneysResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::malformed(e.to_string(), Some(&body)))?;

        convert_journeys(&parsed).map_err(|e| FetchError::malformed(e.to_string(), None))
    }

    /// Fetch the full station directory, keyed by id.
    ///
    /// Every entry must carry at least a string `id` and `name`; anything
    /// else fails the whole directory. Any status other than 200 is an
    /// `Http` error.
    pub async fn stations(&self) -> Result<BTreeMap<String, StationDto>, FetchError> {
        let url = format!("{}/stations", self.base_url);

        let response = self.http.get(&url).send().await?;

        // Only 200 carries a directory
        let status = response.status();
        if status.is_success() && status != reqwest::StatusCode::OK {
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: "expected 200 OK".to_string(),
            });
        }
        let body = success_body(response).await?;

        serde_json::from_str(&body).map_err(|e| FetchError::malformed(e.to_string(), Some(&body)))
    }

    /// Look up a single station's display name.
    pub async fn station_name(&self, id: &StationId) -> Result<String, FetchError> {
        let url = format!("{}/stations/{}", self.base_url, id.as_str());

        let response = self.http.get(&url).send().await?;
        let body = success_body(response).await?;

        let station: StationNameDto = serde_json::from_str(&body)
            .map_err(|e| FetchError::malformed(e.to_string(), Some(&body)))?;

        Ok(station.name)
    }
}

/// Read the body of a successful response, or turn the status into an error.
async fn success_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Http {
            status: status.as_u16(),
            message: body.chars().take(500).collect(),
        });
    }

    Ok(response.text().await?)
}
