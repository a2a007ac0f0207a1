//! In-process fake of the transport API for tests.
//!
//! Serves `/journeys`, `/stations` and `/stations/{id}` from canned bodies
//! on an ephemeral localhost port, and records what it was asked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};

#[derive(Default)]
struct FakeState {
    journeys: (u16, String),
    stations: (u16, String),
    names: HashMap<String, String>,
    journey_queries: Vec<HashMap<String, String>>,
    name_lookups: usize,
    delay: Duration,
}

/// A scriptable transport API.
#[derive(Clone)]
pub struct FakeApi {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let state = FakeState {
            journeys: (200, r#"{"journeys": []}"#.to_string()),
            stations: (200, "{}".to_string()),
            ..FakeState::default()
        };
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_journeys(&self, status: u16, body: impl Into<String>) {
        self.inner.lock().unwrap().journeys = (status, body.into());
    }

    /// Delay every `/journeys` response after recording the query.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = delay;
    }

    pub fn set_stations(&self, status: u16, body: impl Into<String>) {
        self.inner.lock().unwrap().stations = (status, body.into());
    }

    pub fn add_station(&self, id: &str, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .names
            .insert(id.to_string(), name.to_string());
    }

    pub fn journey_queries(&self) -> Vec<HashMap<String, String>> {
        self.inner.lock().unwrap().journey_queries.clone()
    }

    pub fn name_lookups(&self) -> usize {
        self.inner.lock().unwrap().name_lookups
    }

    /// Start serving and return the base URL.
    pub async fn serve(&self) -> String {
        let router = Router::new()
            .route("/journeys", get(journeys))
            .route("/stations", get(stations))
            .route("/stations/:id", get(station))
            .with_state(self.clone());

        serve_router(router).await
    }
}

/// Serve any router on an ephemeral port and return its base URL.
pub async fn serve_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A journeys body with one journey per `(departure, arrival, legs)` entry.
///
/// Intermediate legs are filled in between the two endpoints.
pub fn journeys_body(journeys: &[(&str, &str, usize)]) -> String {
    let journeys: Vec<serde_json::Value> = journeys
        .iter()
        .map(|(departure, arrival, legs)| {
            let legs: Vec<serde_json::Value> = (0..*legs)
                .map(|i| {
                    serde_json::json!({
                        "departure": if i == 0 { Some(*departure) } else { None },
                        "plannedDeparture": departure,
                        "arrival": if i + 1 == *legs { Some(*arrival) } else { None },
                        "plannedArrival": arrival,
                    })
                })
                .collect();
            serde_json::json!({ "type": "journey", "legs": legs })
        })
        .collect();

    serde_json::json!({ "journeys": journeys }).to_string()
}

fn reply(status: u16, body: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn journeys(
    State(api): State<FakeApi>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let ((status, body), delay) = {
        let mut state = api.inner.lock().unwrap();
        state.journey_queries.push(query);
        (state.journeys.clone(), state.delay)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply(status, body)
}

async fn stations(State(api): State<FakeApi>) -> Response {
    let (status, body) = api.inner.lock().unwrap().stations.clone();
    reply(status, body)
}

async fn station(State(api): State<FakeApi>, Path(id): Path<String>) -> Response {
    let name = {
        let mut state = api.inner.lock().unwrap();
        state.name_lookups += 1;
        state.names.get(&id).cloned()
    };

    match name {
        Some(name) => reply(
            200,
            serde_json::json!({ "type": "station", "id": id, "name": name }).to_string(),
        ),
        None => reply(404, r#"{"message": "station not found"}"#.to_string()),
    }
}
