//! Error types for the calibration pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification callers use to tell bad input from a broken system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The request itself was unacceptable
  Validation,
  /// An external resource (image file, model file) could not be used
  Resource,
  /// Something inside the service broke
  Internal,
}

#[derive(Error, Debug)]
pub enum CalibrationError {
  #[error("No ratings provided for calibration")]
  EmptyRatings,

  #[error("Invalid rating for {image_id}: must be 1-5 (got {rating})")]
  InvalidRating { image_id: String, rating: i64 },

  #[error("Invalid user id '{user_id}'")]
  InvalidUserId { user_id: String },

  #[error("No valid images found for calibration")]
  NoResolvableImages,

  #[error("Failed to open image {}: {source}", path.display())]
  ImageOpen {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to decode image {}: {source}", path.display())]
  ImageDecode {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },

  #[error("Backbone not loaded; cannot extract features from {}", path.display())]
  BackboneUnavailable { path: PathBuf },

  #[error("Inference failed: {message}")]
  Inference { message: String },

  #[error("Shape mismatch: expected {expected}, got {actual}")]
  ShapeMismatch { expected: String, actual: String },

  #[error("Failed to load learner weights: {message}")]
  WeightsLoad { message: String },

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl CalibrationError {
  pub fn invalid_rating(image_id: impl Into<String>, rating: i64) -> Self {
    Self::InvalidRating { image_id: image_id.into(), rating }
  }

  pub fn invalid_user_id(user_id: impl Into<String>) -> Self {
    Self::InvalidUserId { user_id: user_id.into() }
  }

  pub fn inference(message: impl std::fmt::Display) -> Self {
    Self::Inference { message: message.to_string() }
  }

  pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
    Self::ShapeMismatch { expected: expected.into(), actual: actual.into() }
  }

  pub fn weights_load(message: impl std::fmt::Display) -> Self {
    Self::WeightsLoad { message: message.to_string() }
  }

  /// Which side of the contract this error falls on
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::EmptyRatings
      | Self::InvalidRating { .. }
      | Self::InvalidUserId { .. }
      | Self::NoResolvableImages => ErrorKind::Validation,
      Self::ImageOpen { .. } | Self::ImageDecode { .. } | Self::BackboneUnavailable { .. } => {
        ErrorKind::Resource
      }
      Self::Inference { .. }
      | Self::ShapeMismatch { .. }
      | Self::WeightsLoad { .. }
      | Self::Io(_)
      | Self::Serialization(_) => ErrorKind::Internal,
    }
  }

  pub fn is_validation(&self) -> bool {
    self.kind() == ErrorKind::Validation
  }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
