use chrono::{TimeZone, Utc};
use ndarray::{concatenate, Array1, Array2, Axis};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use harmonia::calibration::demo::synthetic_feature;
use harmonia::learner::ParameterGenerator;
use harmonia::store::ArtifactStore;
use harmonia::vision::{Feature, FeatureExtractor, FEATURE_DIM};
use harmonia::{CalibrationError, Ratings, ServiceConfig, VisualService};

/// Returns a fixed feature per file stem
struct FixedExtractor {
  features: HashMap<String, Feature>,
}

impl FeatureExtractor for FixedExtractor {
  fn extract(&self, paths: &[PathBuf]) -> harmonia::Result<Vec<Feature>> {
    paths
      .iter()
      .map(|path| {
        let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
        self
          .features
          .get(stem)
          .cloned()
          .ok_or_else(|| CalibrationError::inference(format!("no fixture for {stem}")))
      })
      .collect()
  }

  fn describe(&self) -> String {
    "fixed".to_string()
  }
}

/// Generator whose weight slice equals its (non-negative) input
fn passthrough_generator() -> ParameterGenerator {
  let identity = Array2::<f32>::eye(FEATURE_DIM);
  let output = concatenate(Axis(0), &[identity.view(), Array2::<f32>::zeros((1, FEATURE_DIM)).view()]).unwrap();
  ParameterGenerator::from_parts(identity, Array1::zeros(FEATURE_DIM), output, Array1::zeros(FEATURE_DIM + 1))
    .unwrap()
}

fn config_in(temp: &TempDir) -> ServiceConfig {
  ServiceConfig { data_dir: temp.path().to_path_buf(), ..ServiceConfig::default() }
}

/// Service whose calibration directory holds one dummy file per fixture
fn service_with_fixtures(temp: &TempDir, fixtures: &[(&str, Feature)], generator: ParameterGenerator) -> VisualService {
  let config = config_in(temp);
  std::fs::create_dir_all(config.calibration_dir()).unwrap();
  for (id, _) in fixtures {
    std::fs::write(config.calibration_dir().join(format!("{id}.jpg")), b"fixture").unwrap();
  }

  let features = fixtures.iter().map(|(id, feature)| (id.to_string(), feature.clone())).collect();
  VisualService::with_parts(config, Some(Arc::new(FixedExtractor { features })), generator)
}

fn demo_service(temp: &TempDir) -> VisualService {
  VisualService::with_parts(config_in(temp), None, ParameterGenerator::seeded())
}

#[test]
fn test_embedding_width_and_images_rated() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  let ratings = Ratings::new([("calib_001", 5), ("calib_002", 3), ("calib_003", 1), ("calib_004", 4)]).unwrap();
  let artifact = service.calibrate("alice", &ratings, Some("female"), Some("male")).unwrap();

  assert_eq!(artifact.self_analysis.embedding_vector.len(), FEATURE_DIM);
  assert_eq!(artifact.meta.images_rated, 4);
  assert_eq!(artifact.meta.user_id, "alice");
  assert_eq!(artifact.meta.gender, "female");
  assert!(artifact.meta.calibration_timestamp.ends_with('Z'));
  assert!(artifact.self_analysis.embedding_vector.iter().all(|v| v.is_finite()));
}

#[test]
fn test_weights_are_linear_in_rating() {
  let temp = TempDir::new().unwrap();
  let mut a = Feature::zeros(FEATURE_DIM);
  a[0] = 1.0;
  let mut b = Feature::zeros(FEATURE_DIM);
  b[1] = 1.0;
  let mut c = Feature::zeros(FEATURE_DIM);
  c[2] = 1.0;

  let service =
    service_with_fixtures(&temp, &[("a", a), ("b", b), ("c", c)], passthrough_generator());

  // weights: a -> 1.0, b -> 0.5, c -> 0.0
  let ratings = Ratings::new([("a", 5), ("b", 3), ("c", 1)]).unwrap();
  let artifact = service.calibrate("u", &ratings, None, None).unwrap();
  let embedding = &artifact.self_analysis.embedding_vector;

  let total = 1.5f32 + 1e-8;
  assert!((embedding[0] - 1.0 / total).abs() < 1e-6);
  assert!((embedding[1] - 0.5 / total).abs() < 1e-6);
  assert_eq!(embedding[2], 0.0);
}

#[test]
fn test_ideal_vector_is_centroid_of_liked() {
  let temp = TempDir::new().unwrap();
  let service = service_with_fixtures(
    &temp,
    &[("zeros", Feature::zeros(FEATURE_DIM)), ("ones", Feature::ones(FEATURE_DIM)), ("meh", Feature::from_elem(FEATURE_DIM, 9.0))],
    ParameterGenerator::seeded(),
  );

  let ratings = Ratings::new([("zeros", 4), ("ones", 5), ("meh", 3)]).unwrap();
  let artifact = service.calibrate("u", &ratings, None, None).unwrap();
  assert_eq!(artifact.preference_model.ideal_vector, vec![0.5; FEATURE_DIM]);
}

#[test]
fn test_ideal_vector_empty_without_likes() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  let ratings = Ratings::new([("x", 1), ("y", 2), ("z", 3)]).unwrap();
  let artifact = service.calibrate("u", &ratings, None, None).unwrap();
  assert!(artifact.preference_model.ideal_vector.is_empty());
}

#[test]
fn test_confidence_properties() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  for pair in [[1, 5], [3, 3], [5, 5]] {
    let ratings = Ratings::new([("p", pair[0]), ("q", pair[1])]).unwrap();
    let artifact = service.calibrate("pair", &ratings, None, None).unwrap();
    assert_eq!(artifact.preference_model.calibration_confidence, 0.5);
  }

  let decisive = Ratings::new([("a", 1), ("b", 1), ("c", 1), ("d", 5), ("e", 5), ("f", 5)]).unwrap();
  let flat = Ratings::new([("a", 3), ("b", 3), ("c", 3), ("d", 3), ("e", 3), ("f", 3)]).unwrap();
  let high = service.calibrate("decisive", &decisive, None, None).unwrap();
  let low = service.calibrate("flat", &flat, None, None).unwrap();
  assert!(high.preference_model.calibration_confidence > low.preference_model.calibration_confidence);
}

#[test]
fn test_demo_features_are_deterministic_unit_vectors() {
  let first = synthetic_feature("calib_042", 1);
  let second = synthetic_feature("calib_042", 5);
  assert_eq!(first.to_vec(), second.to_vec());
  assert!((first.dot(&first).sqrt() - 1.0).abs() < 1e-5);
}

#[test]
fn test_repeated_demo_calibration_is_identical() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);
  let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();

  let ratings = Ratings::new([("calib_001", 5), ("calib_002", 2), ("calib_003", 4)]).unwrap();
  let first = service.calibrate_at("bob", &ratings, None, None, at).unwrap();
  let second = service.calibrate_at("bob", &ratings, None, None, at).unwrap();

  assert_eq!(first, second);
  assert_eq!(service.load("bob").unwrap(), Some(second));
}

#[test]
fn test_fresh_services_agree() {
  let temp_a = TempDir::new().unwrap();
  let temp_b = TempDir::new().unwrap();
  let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
  let ratings = Ratings::new([("calib_007", 4), ("calib_008", 1)]).unwrap();

  let a = demo_service(&temp_a).calibrate_at("u", &ratings, None, None, at).unwrap();
  let b = demo_service(&temp_b).calibrate_at("u", &ratings, None, None, at).unwrap();
  assert_eq!(a, b);
}

#[test]
fn test_save_load_round_trip() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  let ratings = Ratings::new([("calib_001", 5), ("calib_002", 4)]).unwrap();
  let artifact = service.calibrate("carol", &ratings, None, None).unwrap();

  let store = ArtifactStore::new(temp.path().join("profiles"));
  let loaded = store.load("carol").unwrap().unwrap();
  assert_eq!(loaded, artifact);

  store.save("dave", &artifact).unwrap();
  assert_eq!(store.load("dave").unwrap(), Some(artifact));
}

#[test]
fn test_invalid_ratings_never_reach_the_store() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  assert!(matches!(Ratings::new(Vec::<(String, i64)>::new()), Err(CalibrationError::EmptyRatings)));
  assert!(matches!(Ratings::new([("a", 0)]), Err(CalibrationError::InvalidRating { .. })));
  assert!(matches!(Ratings::new([("a", 6)]), Err(CalibrationError::InvalidRating { .. })));

  assert!(service.load("anyone").unwrap().is_none());
  assert!(!temp.path().join("profiles").exists());
}

#[test]
fn test_recalibration_replaces_previous_artifact() {
  let temp = TempDir::new().unwrap();
  let service = demo_service(&temp);

  let first = Ratings::new([("calib_001", 5)]).unwrap();
  let second = Ratings::new([("calib_001", 1), ("calib_002", 2)]).unwrap();
  service.calibrate("erin", &first, None, None).unwrap();
  service.calibrate("erin", &second, None, None).unwrap();

  let stored = service.load("erin").unwrap().unwrap();
  assert_eq!(stored.meta.images_rated, 2);
  assert!(stored.preference_model.ideal_vector.is_empty());
}
