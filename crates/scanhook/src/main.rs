mod adapters;
mod api;
mod auth;
mod callback;
mod config;
mod jobs;
mod message;
mod models;
mod parser;
mod security;
mod target;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    adapters::{NmapAdapter, ToolAdapter},
    api::{health, nmap_command},
    callback::CallbackClient,
    config::AppConfig,
    target::{SystemResolver, TargetResolver},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scanner: Arc<dyn ToolAdapter>,
    pub resolver: Arc<dyn TargetResolver>,
    pub callback: CallbackClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Arc::new(AppConfig::load()?);

    let state = AppState {
        scanner: Arc::new(NmapAdapter::from_config(&config)),
        resolver: Arc::new(
            SystemResolver::from_system_conf().context("failed to read resolver configuration")?,
        ),
        callback: CallbackClient::new(config.callback_timeout_secs)
            .context("failed to build callback client")?,
        config: config.clone(),
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, nmap = %config.nmap_path, ports = %config.scan_ports, "scanhook listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/nmap", post(nmap_command))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}
