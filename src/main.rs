// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::{get, patch, post, put}, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::load_app_config;
use crate::infrastructure::controller_client::ControllerClient;
use crate::infrastructure::local_state_file::JsonFileState;
use crate::infrastructure::postgrest_store::PostgrestStore;
use crate::presentation::app_state::{Adapters, AppState};
use crate::presentation::handlers::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config().context("Failed to load configuration")?;

    // Create adapters (infrastructure layer)
    let store = Arc::new(PostgrestStore::new(
        &config.profile_store.url,
        config.profile_store.api_key.clone(),
        config.profile_store.table.clone(),
        config.profile_store.sensor_table.clone(),
        config.profile_store.timeout(),
    )?);
    let controller = Arc::new(ControllerClient::new(
        &config.controller.base_url,
        config.controller.timeout(),
    )?);
    let local = Arc::new(JsonFileState::open(&config.local_state.path));

    // Create services (application layer): defaults, then local cache
    let state = Arc::new(AppState::new(
        &config,
        Adapters {
            store: store.clone(),
            sensors: store,
            controller,
            local,
        },
    ));

    let sync = state
        .dispatcher
        .clone()
        .spawn(state.mode.subscribe(), state.egg_types.subscribe());

    // Remote overlay last
    let source = state.reconciler.ensure_catalog().await;
    tracing::info!("Egg type catalog ready ({:?})", source);

    state.poller.start(config.polling.interval());

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/egg-types", get(list_egg_types))
        .route("/egg-types/refresh", post(refresh_egg_types))
        .route(
            "/egg-types/selected",
            get(get_selected_egg_type)
                .put(select_egg_type)
                .patch(update_selected_egg_type),
        )
        .route("/egg-types/:id", patch(update_egg_type))
        .route("/configuration/draft", get(get_draft).patch(edit_draft))
        .route("/configuration/save", post(save_configuration))
        .route("/configuration/send", post(send_configuration))
        .route("/configuration/apply", post(apply_configuration))
        .route("/mode", get(get_mode).put(set_mode))
        .route("/actuators", get(get_actuators))
        .route("/actuators/stop-all", post(stop_all_actuators))
        .route("/actuators/:actuator", put(toggle_actuator))
        .route("/auto-controls", get(get_auto_controls))
        .route("/auto-controls/enable-all", post(enable_all_auto_controls))
        .route("/auto-controls/:subsystem", put(set_auto_control))
        .route("/readings/latest", get(latest_reading))
        .route("/settings", get(get_settings).put(save_settings))
        .route("/settings/test-connection", post(test_connection))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;
    tracing::info!("Starting incubator-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sync.abort();
    state.poller.stop();
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
