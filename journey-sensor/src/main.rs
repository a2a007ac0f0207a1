use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use journey_sensor::config::{EntryStore, SetupFlow};
use journey_sensor::registry::{EntryRegistry, RegistrySettings};
use journey_sensor::settings::Settings;
use journey_sensor::transport::TransportConfig;
use journey_sensor::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG overrides; defaults to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    // One HTTP client for every entry and the setup flow
    let http = TransportConfig::default()
        .with_timeout(settings.http_timeout_secs)
        .build_http()?;

    let store = EntryStore::new(&settings.config_path);
    let entries = store.load()?;
    info!(
        path = %store.path().display(),
        entries = entries.len(),
        "loaded config entries"
    );

    let registry = Arc::new(EntryRegistry::new(
        http.clone(),
        store,
        RegistrySettings {
            update_interval: settings.update_interval,
            failure_threshold: settings.failure_threshold,
        },
    ));
    registry.setup_all(entries).await;

    let app = create_router(AppState::new(Arc::clone(&registry), SetupFlow::new(http)));

    let listener = tokio::net::TcpListener::bind(settings.listen_addr).await?;
    info!(addr = %settings.listen_addr, "journey sensors listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown signal received");
        })
        .await?;

    registry.shutdown().await;
    info!("shutdown complete");
    Ok(())
}
