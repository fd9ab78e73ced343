//! Calibration endpoint handlers

use axum::{
  extract::{Extension, Json, Query, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use uuid::Uuid;

use crate::calibration::Ratings;
use crate::error::CalibrationError;
use crate::server::identity::CurrentUser;
use crate::server::middleware::RequestContext;
use crate::server::state::AppState;
use crate::server::types::{
  ApiError, ApiFailure, ApiResult, BaseResponse, CalibrationImagesResponse, CalibrationSubmission, ImagesQuery,
  VisualVectorResponse,
};

/// GET /api/calibration/images - Images offered for rating
pub async fn list_images(
  State(state): State<AppState>,
  CurrentUser(_user_id): CurrentUser,
  Query(query): Query<ImagesQuery>,
) -> ResponseJson<BaseResponse<CalibrationImagesResponse>> {
  let images = state.service.list_calibration_images(query.count);
  let total = images.len();

  ResponseJson(BaseResponse::success(CalibrationImagesResponse { images, total }, Uuid::new_v4()))
}

/// POST /api/calibration/submit - Run the pipeline for the calling user
pub async fn submit(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  CurrentUser(user_id): CurrentUser,
  Json(submission): Json<CalibrationSubmission>,
) -> ApiResult<VisualVectorResponse> {
  let transaction_id = Uuid::new_v4();

  let ratings = Ratings::new(submission.ratings).map_err(|e| rating_failure(&e, transaction_id))?;

  context.log_info(&format!("Calibrating {user_id} from {} ratings", ratings.len()));

  let service = state.service.clone();
  let gender = submission.gender;
  let target = submission.preference_target;
  let job_user = user_id.clone();
  let outcome = tokio::task::spawn_blocking(move || {
    service.calibrate(&job_user, &ratings, gender.as_deref(), target.as_deref())
  })
  .await;

  match outcome {
    Ok(Ok(visual_vector)) => {
      context.log_success(&format!("Stored visual vector for {user_id}"));
      Ok(ResponseJson(BaseResponse::success(VisualVectorResponse { visual_vector }, transaction_id)))
    }
    Ok(Err(e)) if e.is_validation() => {
      context.log_warn(&format!("Calibration rejected: {e}"));
      Err(ApiError::new("calibration_rejected", &e.to_string()).into_failure(StatusCode::BAD_REQUEST, transaction_id))
    }
    Ok(Err(e)) => {
      context.log_error(&format!("Calibration failed: {e}"));
      Err(
        ApiError::new("calibration_failed", &format!("Calibration failed: {e}"))
          .into_failure(StatusCode::INTERNAL_SERVER_ERROR, transaction_id),
      )
    }
    Err(e) => {
      context.log_error(&format!("Calibration task aborted: {e}"));
      Err(
        ApiError::new("calibration_failed", &format!("Calibration failed: {e}"))
          .into_failure(StatusCode::INTERNAL_SERVER_ERROR, transaction_id),
      )
    }
  }
}

/// GET /api/calibration/vector - The calling user's stored visual vector
pub async fn get_vector(
  State(state): State<AppState>,
  CurrentUser(user_id): CurrentUser,
) -> ApiResult<VisualVectorResponse> {
  let transaction_id = Uuid::new_v4();

  match state.service.load(&user_id) {
    Ok(Some(visual_vector)) => {
      Ok(ResponseJson(BaseResponse::success(VisualVectorResponse { visual_vector }, transaction_id)))
    }
    Ok(None) => Err(
      ApiError::new("vector_not_found", "Visual vector not found. Complete calibration first.")
        .into_failure(StatusCode::NOT_FOUND, transaction_id),
    ),
    Err(e) if e.is_validation() => {
      Err(ApiError::new("vector_rejected", &e.to_string()).into_failure(StatusCode::BAD_REQUEST, transaction_id))
    }
    Err(e) => Err(
      ApiError::new("vector_load_failed", &format!("Failed to load visual vector: {e}"))
        .into_failure(StatusCode::INTERNAL_SERVER_ERROR, transaction_id),
    ),
  }
}

/// Map a boundary validation failure to its 400 response
fn rating_failure(error: &CalibrationError, transaction_id: Uuid) -> ApiFailure {
  let api_error = match error {
    CalibrationError::EmptyRatings => ApiError::new("no_ratings", "No ratings provided"),
    CalibrationError::InvalidRating { image_id, rating } => {
      ApiError::new("invalid_rating", &format!("Invalid rating for {image_id}: must be 1-5"))
        .with_context(serde_json::json!({ "image_id": image_id, "rating": rating }))
    }
    other => ApiError::new("calibration_rejected", &other.to_string()),
  };

  api_error.into_failure(StatusCode::BAD_REQUEST, transaction_id)
}
