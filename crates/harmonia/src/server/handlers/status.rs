//! Health and status endpoint handlers

use axum::{extract::State, response::Json};
use uuid::Uuid;

use crate::server::state::AppState;
use crate::server::types::{BaseResponse, HealthResponse, StatusResponse};

const SERVICE_NAME: &str = "harmonia";
const PHASE: &str = "visual_calibration";

/// GET /api/health - Liveness check
pub async fn health() -> Json<BaseResponse<HealthResponse>> {
  let response = HealthResponse { status: "healthy".to_string(), service: SERVICE_NAME.to_string() };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /api/status - Version, capabilities and where data lives
pub async fn status(State(state): State<AppState>) -> Json<BaseResponse<StatusResponse>> {
  let service = &state.service;

  let mut features = vec!["calibration".to_string(), "demo_features".to_string()];
  if service.backbone_loaded() {
    features.push("image_features".to_string());
  }

  let response = StatusResponse {
    version: env!("CARGO_PKG_VERSION").to_string(),
    phase: PHASE.to_string(),
    features,
    backbone_loaded: service.backbone_loaded(),
    backbone: service.backbone_description(),
    calibration_dir: service.calibration_dir().display().to_string(),
    profiles_dir: service.profiles_dir().display().to_string(),
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}
