//! Rating-weighted aggregation and the confidence heuristic

use crate::error::{CalibrationError, Result};
use crate::vision::Feature;

/// Added to the weight sum so an all-1-star submission divides cleanly
pub const WEIGHT_EPSILON: f32 = 1e-8;

/// Ratings below this count get the neutral confidence
const MIN_RATINGS_FOR_CONFIDENCE: usize = 3;
const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Map a 1-5 star rating linearly onto `[0, 1]`
pub fn rating_weight(rating: u8) -> f32 {
  (f32::from(rating) - 1.0) / 4.0
}

/// Weighted mean of features, weights derived from the ratings
pub fn weighted_mean(features: &[Feature], ratings: &[u8]) -> Result<Feature> {
  let first = features.first().ok_or(CalibrationError::NoResolvableImages)?;
  if features.len() != ratings.len() {
    return Err(CalibrationError::shape_mismatch(
      format!("{} ratings", features.len()),
      format!("{} ratings", ratings.len()),
    ));
  }

  let mut sum = Feature::zeros(first.len());
  let mut total_weight = 0.0f32;

  for (feature, &rating) in features.iter().zip(ratings) {
    if feature.len() != sum.len() {
      return Err(CalibrationError::shape_mismatch(
        format!("[{}]", sum.len()),
        format!("[{}]", feature.len()),
      ));
    }
    let weight = rating_weight(rating);
    sum.scaled_add(weight, feature);
    total_weight += weight;
  }

  Ok(sum / (total_weight + WEIGHT_EPSILON))
}

/// Unweighted mean of features; `None` for an empty set
pub fn centroid(features: &[Feature]) -> Option<Feature> {
  let first = features.first()?;
  let mut sum = Feature::zeros(first.len());
  for feature in features {
    sum += feature;
  }
  Some(sum / features.len() as f32)
}

/// Higher rating variance reads as more decisive preferences.
///
/// Sample variance (n - 1 denominator) halved, capped at 1, rounded to two decimals.
pub fn calibration_confidence(ratings: &[u8]) -> f64 {
  if ratings.len() < MIN_RATINGS_FOR_CONFIDENCE {
    return NEUTRAL_CONFIDENCE;
  }

  let n = ratings.len() as f64;
  let mean = ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / n;
  let variance = ratings.iter().map(|&r| (f64::from(r) - mean).powi(2)).sum::<f64>() / (n - 1.0);

  let confidence = (variance / 2.0).min(1.0);
  (confidence * 100.0).round() / 100.0
}
