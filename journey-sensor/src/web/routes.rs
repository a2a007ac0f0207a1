//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tracing::{error, warn};

use crate::config::{EntryOptions, SetupError};
use crate::registry::RegistryError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/setup/stations", post(setup_stations))
        .route("/api/entries", get(list_entries).post(create_entry))
        .route("/api/entries/:id", get(get_entry).delete(delete_entry))
        .route("/api/entries/:id/options", put(update_options))
        .route("/api/entries/:id/refresh", post(refresh_entry))
        .route("/api/sensors", get(list_sensors))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List the station names a host offers.
async fn setup_stations(
    State(state): State<AppState>,
    Json(req): Json<SetupStationsRequest>,
) -> Result<Json<SetupStationsResponse>, AppError> {
    let directory = state.setup.validate_host(&req.host).await?;
    let stations = directory.names().map(str::to_string).collect();
    Ok(Json(SetupStationsResponse { stations }))
}

async fn list_entries(State(state): State<AppState>) -> Json<EntriesResponse> {
    let entries = state
        .registry
        .entries()
        .await
        .iter()
        .map(EntryResult::from_snapshot)
        .collect();
    Json(EntriesResponse { entries })
}

async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<EntryResult>, AppError> {
    let snapshot = state
        .registry
        .entry(&entry_id)
        .await
        .ok_or_else(|| AppError::NotFound {
            message: format!("no entry with id {entry_id}"),
        })?;
    Ok(Json(EntryResult::from_snapshot(&snapshot)))
}

/// Validate the host, resolve the stations and set up a new entry.
async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResult>), AppError> {
    let config = state
        .setup
        .create_entry(&req.host, &req.from, &req.to, req.options())
        .await?;

    let snapshot = state.registry.add(config).await?;
    Ok((StatusCode::CREATED, Json(EntryResult::from_snapshot(&snapshot))))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.remove(&entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Change options; the entry is reloaded.
async fn update_options(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
    Json(req): Json<UpdateOptionsRequest>,
) -> Result<Json<EntryResult>, AppError> {
    let options = EntryOptions {
        max_journeys: req.max_journeys,
    };
    let snapshot = state.registry.update_options(&entry_id, options).await?;
    Ok(Json(EntryResult::from_snapshot(&snapshot)))
}

/// Refresh an entry now.
async fn refresh_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<RefreshResult>, AppError> {
    let refreshed = state.registry.refresh(&entry_id).await?;
    Ok(Json(RefreshResult::from_state(&refreshed)))
}

async fn list_sensors(State(state): State<AppState>) -> Json<SensorsResponse> {
    let sensors = state
        .registry
        .sensors()
        .await
        .iter()
        .map(SensorResult::from_view)
        .collect();
    Json(SensorsResponse { sensors })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    BadGateway { message: String },
    Internal { message: String },
    Setup(SetupError),
}

impl From<SetupError> for AppError {
    fn from(e: SetupError) -> Self {
        AppError::Setup(e)
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        let message = e.to_string();
        match e {
            RegistryError::NotFound(_) => AppError::NotFound { message },
            RegistryError::AlreadyConfigured(_) | RegistryError::InvalidOptions(_) => {
                AppError::BadRequest { message }
            }
            RegistryError::Fetch(_) => AppError::BadGateway { message },
            RegistryError::Config(_) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message, None),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message, None),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message, None),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message, None),
            AppError::Setup(e) => {
                let status = match e {
                    SetupError::CannotConnect { .. } | SetupError::Unknown { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string(), Some(e.code()))
            }
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            code,
        });
        (status, body).into_response()
    }
}
