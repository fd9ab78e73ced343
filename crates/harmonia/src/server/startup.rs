//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::serve;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::calibration::VisualService;
use crate::config::ServiceConfig;
use crate::server::{routing::create_router, state::AppState};

/// Build the service from `config` and serve it on `addr` until shutdown
pub async fn start_server(addr: SocketAddr, config: ServiceConfig) -> Result<()> {
  bentley::info!("Starting harmonia REST server on {addr}");

  let service = tokio::task::spawn_blocking(move || VisualService::new(&config))
    .await
    .context("Visual service initialisation panicked")?
    .context("Failed to initialise visual service")?;

  let app = create_router(AppState::new(service))
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(addr).await.with_context(|| format!("Failed to bind {addr}"))?;
  bentley::success!("Server listening on {addr}");

  serve(listener, app).await.context("Server error")?;
  bentley::info!("Server shutdown gracefully");
  Ok(())
}
