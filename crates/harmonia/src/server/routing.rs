//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{calibration, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status endpoints
    .route("/api/health", get(status::health))
    .route("/api/status", get(status::status))
    // Calibration endpoints
    .route("/api/calibration/images", get(calibration::list_images))
    .route("/api/calibration/submit", post(calibration::submit))
    .route("/api/calibration/vector", get(calibration::get_vector))
    .layer(middleware::from_fn(request_context_middleware))
    .with_state(state)
}
