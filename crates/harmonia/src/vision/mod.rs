//! Image feature extraction
//!
//! A pretrained classification backbone with its final layer removed turns
//! each calibration image into a fixed-width feature vector.

#[cfg(feature = "ml-features")]
pub mod backbone;
pub mod preprocess;

use ndarray::Array1;
use std::path::{Path, PathBuf};

use crate::error::{CalibrationError, Result};

/// Width of every image feature and of the user embedding
pub const FEATURE_DIM: usize = 512;

/// One image's feature vector
pub type Feature = Array1<f32>;

/// Trait abstraction over the backbone so the pipeline can run without ONNX Runtime
#[cfg_attr(test, mockall::automock)]
pub trait FeatureExtractor: Send + Sync {
  /// Extract one feature per image, in input order
  fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Feature>>;

  /// Extract the feature of a single image
  fn extract_one(&self, path: &Path) -> Result<Feature> {
    self
      .extract(&[path.to_path_buf()])?
      .into_iter()
      .next()
      .ok_or_else(|| CalibrationError::inference("backbone returned no features"))
  }

  /// Human readable description for status output
  fn describe(&self) -> String;
}

/// Scale a vector to unit L2 length; near-zero vectors are returned unchanged
pub fn l2_normalize(mut feature: Feature) -> Feature {
  let magnitude = feature.dot(&feature).sqrt();

  if magnitude < f32::EPSILON {
    bentley::warn!("Zero-magnitude feature detected - returning unchanged");
    return feature;
  }

  feature.mapv_inplace(|value| value / magnitude);
  feature
}

/// Check that a feature has the expected width
pub fn ensure_width(feature: &Feature) -> Result<()> {
  if feature.len() != FEATURE_DIM {
    return Err(CalibrationError::shape_mismatch(
      format!("[{FEATURE_DIM}]"),
      format!("[{}]", feature.len()),
    ));
  }
  Ok(())
}
