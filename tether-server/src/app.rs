use crate::config::ServerConfig;
use crate::relay::{Relay, RelayCommand};
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Starts the relay actor and returns the service that feeds it.
pub fn spawn_relay(config: &ServerConfig) -> SignalingService {
    let (cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>(config.command_queue);
    let service = SignalingService::new(cmd_tx, config.ice_servers.clone());

    let relay = Relay::new(cmd_rx, Arc::new(service.clone()));
    tokio::spawn(async move {
        relay.run().await;
    });

    service
}

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": service.connection_count(),
    }))
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    serve_with_listener(listener, config).await
}

/// Runs the relay on an already bound listener. Tests bind `127.0.0.1:0` and pass it here.
pub async fn serve_with_listener(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let service = spawn_relay(&config);
    let app = router(service);

    info!(
        "Signaling server listening on http://{}",
        listener.local_addr().context("listener has no local address")?
    );
    axum::serve(listener, app)
        .await
        .context("signaling server stopped")?;
    Ok(())
}
