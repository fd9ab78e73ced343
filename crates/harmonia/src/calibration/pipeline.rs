//! The calibration pipeline: ratings in, persisted visual vector out

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::aggregate::{calibration_confidence, centroid, weighted_mean};
use super::demo::synthetic_feature;
use super::images::{find_image, list_calibration_images, CalibrationImage};
use super::ratings::Ratings;
use crate::artifact::{
  AttractionTriggers, DetectedTraits, PreferenceModel, SelfAnalysis, VisualVector, VisualVectorMeta,
};
use crate::config::ServiceConfig;
use crate::error::{CalibrationError, Result};
use crate::learner::ParameterGenerator;
use crate::store::{validate_user_id, ArtifactStore};
use crate::vision::{ensure_width, Feature, FeatureExtractor};

/// Ratings at or above this count as liked
pub const LIKED_THRESHOLD: u8 = 4;
/// Ratings at or below this count as disliked
pub const DISLIKED_THRESHOLD: u8 = 2;

/// Where a rated image's feature came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
  Image,
  Demo,
}

struct Resolved {
  rating: u8,
  feature: Feature,
}

/// Long-lived calibration service: extractor, generator and store, built once
pub struct VisualService {
  config: ServiceConfig,
  calibration_dir: PathBuf,
  extractor: Option<Arc<dyn FeatureExtractor>>,
  generator: ParameterGenerator,
  store: ArtifactStore,
}

impl VisualService {
  /// Build the service from configuration, loading the backbone and learner weights
  pub fn new(config: &ServiceConfig) -> Result<Self> {
    let extractor = Self::load_extractor(config)?;
    let generator = ParameterGenerator::load_or_seeded(config.learner_weights.as_deref())?;

    let service = Self::with_parts(config.clone(), extractor, generator);
    bentley::info!(
      "Visual service ready (backbone: {}, profiles: {})",
      service.backbone_description().unwrap_or_else(|| "none".to_string()),
      service.store.profiles_dir().display()
    );
    Ok(service)
  }

  /// Assemble a service from already-built components
  pub fn with_parts(
    config: ServiceConfig,
    extractor: Option<Arc<dyn FeatureExtractor>>,
    generator: ParameterGenerator,
  ) -> Self {
    Self {
      calibration_dir: config.calibration_dir(),
      store: ArtifactStore::new(config.profiles_dir()),
      config,
      extractor,
      generator,
    }
  }

  #[cfg(feature = "ml-features")]
  fn load_extractor(config: &ServiceConfig) -> Result<Option<Arc<dyn FeatureExtractor>>> {
    match &config.backbone_model {
      Some(path) if path.is_file() => {
        let backbone = crate::vision::backbone::OnnxBackbone::load(path)?;
        Ok(Some(Arc::new(backbone)))
      }
      Some(path) => {
        bentley::warn!("Backbone model {} not found - only demo features are available", path.display());
        Ok(None)
      }
      None => {
        bentley::verbose!("No backbone model configured - only demo features are available");
        Ok(None)
      }
    }
  }

  #[cfg(not(feature = "ml-features"))]
  fn load_extractor(config: &ServiceConfig) -> Result<Option<Arc<dyn FeatureExtractor>>> {
    if config.backbone_model.is_some() {
      bentley::warn!("Built without ml-features - ignoring the configured backbone model");
    }
    Ok(None)
  }

  pub fn config(&self) -> &ServiceConfig {
    &self.config
  }

  pub fn calibration_dir(&self) -> &Path {
    &self.calibration_dir
  }

  pub fn profiles_dir(&self) -> &Path {
    self.store.profiles_dir()
  }

  pub fn backbone_loaded(&self) -> bool {
    self.extractor.is_some()
  }

  pub fn backbone_description(&self) -> Option<String> {
    self.extractor.as_ref().map(|extractor| extractor.describe())
  }

  /// Where `user_id`'s artifact lives
  pub fn artifact_path(&self, user_id: &str) -> Result<PathBuf> {
    self.store.artifact_path(user_id)
  }

  /// Run a calibration stamped with the current time
  pub fn calibrate(
    &self,
    user_id: &str,
    ratings: &Ratings,
    gender: Option<&str>,
    preference_target: Option<&str>,
  ) -> Result<VisualVector> {
    self.calibrate_at(user_id, ratings, gender, preference_target, Utc::now())
  }

  /// Run a calibration stamped with `calibrated_at`.
  ///
  /// Nothing is written unless every step succeeds; a successful run replaces
  /// the user's previous artifact.
  pub fn calibrate_at(
    &self,
    user_id: &str,
    ratings: &Ratings,
    gender: Option<&str>,
    preference_target: Option<&str>,
    calibrated_at: DateTime<Utc>,
  ) -> Result<VisualVector> {
    validate_user_id(user_id)?;

    let resolved = self.resolve(ratings)?;
    if resolved.is_empty() {
      return Err(CalibrationError::NoResolvableImages);
    }

    let features: Vec<Feature> = resolved.iter().map(|entry| entry.feature.clone()).collect();
    let values: Vec<u8> = resolved.iter().map(|entry| entry.rating).collect();

    let aggregate = weighted_mean(&features, &values)?;
    let embedding = self.generator.user_weights(aggregate.view())?;

    let liked: Vec<Feature> =
      resolved.iter().filter(|entry| entry.rating >= LIKED_THRESHOLD).map(|entry| entry.feature.clone()).collect();
    let disliked: Vec<Feature> =
      resolved.iter().filter(|entry| entry.rating <= DISLIKED_THRESHOLD).map(|entry| entry.feature.clone()).collect();

    let ideal_vector = centroid(&liked).map(|ideal| ideal.to_vec()).unwrap_or_default();
    let confidence = calibration_confidence(&values);

    let artifact = VisualVector {
      meta: VisualVectorMeta::new(user_id, gender, preference_target, calibrated_at, ratings.len()),
      self_analysis: SelfAnalysis { embedding_vector: embedding.to_vec(), detected_traits: DetectedTraits::pending() },
      preference_model: PreferenceModel {
        ideal_vector,
        attraction_triggers: detect_triggers(&liked, &disliked),
        calibration_confidence: confidence,
      },
    };

    self.store.save(user_id, &artifact)?;
    bentley::success!(
      "Calibrated {} from {} ratings ({} liked, {} disliked, confidence {:.2})",
      user_id,
      ratings.len(),
      liked.len(),
      disliked.len(),
      confidence
    );

    Ok(artifact)
  }

  /// The stored artifact, if this user has calibrated
  pub fn load(&self, user_id: &str) -> Result<Option<VisualVector>> {
    self.store.load(user_id)
  }

  /// Images offered for rating; `None` uses the configured default count.
  ///
  /// Counts are capped at `max_image_count`.
  pub fn list_calibration_images(&self, count: Option<usize>) -> Vec<CalibrationImage> {
    let count = count.unwrap_or(self.config.default_image_count).min(self.config.max_image_count);
    list_calibration_images(&self.calibration_dir, count, &self.config)
  }

  /// One feature per rated image, in rating order; real images are extracted in one batch
  fn resolve(&self, ratings: &Ratings) -> Result<Vec<Resolved>> {
    let mut sources = Vec::with_capacity(ratings.len());
    let mut paths = Vec::new();

    for (image_id, _) in ratings.iter() {
      match find_image(&self.calibration_dir, image_id) {
        Some(path) => {
          sources.push(Source::Image);
          paths.push(path);
        }
        None => sources.push(Source::Demo),
      }
    }

    let mut extracted = self.extract(&paths)?.into_iter();
    let demo_count = sources.iter().filter(|source| **source == Source::Demo).count();
    bentley::verbose!("Resolved {} images from disk, {} from demo features", paths.len(), demo_count);

    let mut resolved = Vec::with_capacity(ratings.len());
    for ((image_id, rating), source) in ratings.iter().zip(sources) {
      let feature = match source {
        Source::Image => extracted
          .next()
          .ok_or_else(|| CalibrationError::inference(format!("backbone returned no feature for {image_id}")))?,
        Source::Demo => synthetic_feature(image_id, rating),
      };
      ensure_width(&feature)?;
      resolved.push(Resolved { rating, feature });
    }

    Ok(resolved)
  }

  fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Feature>> {
    let Some(first) = paths.first() else {
      return Ok(Vec::new());
    };

    let extractor = self.extractor.as_ref().ok_or_else(|| CalibrationError::BackboneUnavailable { path: first.clone() })?;
    let features = extractor.extract(paths)?;
    if features.len() != paths.len() {
      return Err(CalibrationError::shape_mismatch(
        format!("{} features", paths.len()),
        format!("{} features", features.len()),
      ));
    }
    Ok(features)
  }
}

/// Attraction triggers derived from liked and disliked features.
///
/// No trait classifier exists yet, so both lists stay pending.
pub fn detect_triggers(_liked: &[Feature], _disliked: &[Feature]) -> AttractionTriggers {
  AttractionTriggers::pending()
}
