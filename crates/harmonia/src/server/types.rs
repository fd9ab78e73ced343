//! REST API types with schemars annotations for OpenAPI generation

use axum::{http::StatusCode, response::Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::artifact::VisualVector;
use crate::calibration::CalibrationImage;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

/// Error half of every handler's result
pub type ApiFailure = (StatusCode, Json<BaseResponse<()>>);

/// Handler result carrying a success payload
pub type ApiResult<T> = Result<Json<BaseResponse<T>>, ApiFailure>;

// Status Endpoints
// ================

/// Response for /api/health
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
  pub status: String,
  pub service: String,
}

/// Response for /api/status
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  /// Crate version
  pub version: String,

  /// Product phase served by this build
  pub phase: String,

  /// Capabilities offered by this build
  pub features: Vec<String>,

  /// Whether a real backbone is available for on-disk images
  pub backbone_loaded: bool,

  /// Backbone description when loaded
  pub backbone: Option<String>,

  pub calibration_dir: String,
  pub profiles_dir: String,
}

// Calibration Endpoints
// =====================

/// Query for /api/calibration/images
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ImagesQuery {
  /// Maximum number of images to return
  pub count: Option<usize>,
}

/// Response for /api/calibration/images
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationImagesResponse {
  pub images: Vec<CalibrationImage>,
  pub total: usize,
}

/// Request for /api/calibration/submit
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationSubmission {
  /// `image_id -> rating`, ratings 1 to 5
  #[serde(default)]
  pub ratings: HashMap<String, i64>,

  #[serde(default)]
  pub gender: Option<String>,

  #[serde(default)]
  pub preference_target: Option<String>,
}

/// Response for /api/calibration/submit and /api/calibration/vector
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VisualVectorResponse {
  pub visual_vector: VisualVector,
}

// Helper Functions
// ================

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }

  /// Wrap into the error half of a handler result
  pub fn into_failure(self, status: StatusCode, transaction_id: Uuid) -> ApiFailure {
    (status, Json(BaseResponse::<()>::error(vec![self], transaction_id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_envelope_flattens_data_and_omits_empty_errors() {
    let response = BaseResponse::success(
      HealthResponse { status: "healthy".into(), service: "harmonia".into() },
      Uuid::nil(),
    );
    let value = serde_json::to_value(response).unwrap();

    assert_eq!(value["status"], "healthy");
    assert_eq!(value["versioning"]["latest"], env!("CARGO_PKG_VERSION"));
    assert!(value.get("errors").is_none());
  }

  #[test]
  fn test_submission_defaults() {
    let submission: CalibrationSubmission = serde_json::from_str("{}").unwrap();
    assert!(submission.ratings.is_empty());
    assert!(submission.gender.is_none());
  }
}
