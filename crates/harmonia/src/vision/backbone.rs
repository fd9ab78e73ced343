//! ONNX Runtime backbone session

use ndarray::Array4;
use ort::{
  execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch},
  session::Session,
  value::Value,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{preprocess, Feature, FeatureExtractor, FEATURE_DIM};
use crate::error::{CalibrationError, Result};

/// Pretrained classifier with its classification layer removed, exported to ONNX.
///
/// Running a session needs exclusive access, so it sits behind a mutex; the
/// weights themselves are never modified after loading.
pub struct OnnxBackbone {
  session: Mutex<Session>,
  input_name: String,
  output_name: String,
  model_path: PathBuf,
}

// Model initialization
#[cfg(not(tarpaulin_include))]
impl OnnxBackbone {
  pub fn load(model_path: &Path) -> Result<Self> {
    bentley::info!("Loading backbone from {}", model_path.display());

    let session = Self::build_session(model_path).map_err(CalibrationError::inference)?;

    let input_name = session
      .inputs
      .first()
      .map(|input| input.name.to_string())
      .ok_or_else(|| CalibrationError::inference("backbone model declares no inputs"))?;
    let output_name = session
      .outputs
      .first()
      .map(|output| output.name.to_string())
      .ok_or_else(|| CalibrationError::inference("backbone model declares no outputs"))?;

    bentley::success!("Backbone loaded (input '{}', output '{}')", input_name, output_name);

    Ok(Self { session: Mutex::new(session), input_name, output_name, model_path: model_path.to_path_buf() })
  }

  fn build_session(model_path: &Path) -> ort::Result<Session> {
    Session::builder()?.with_execution_providers(Self::execution_providers())?.commit_from_file(model_path)
  }

  fn execution_providers() -> Vec<ExecutionProviderDispatch> {
    let mut providers = Vec::new();

    #[cfg(target_os = "macos")]
    {
      providers.push(ort::execution_providers::CoreMLExecutionProvider::default().into());
    }

    #[cfg(target_os = "linux")]
    {
      if Self::is_cuda_available() {
        providers.push(ort::execution_providers::CUDAExecutionProvider::default().build().error_on_failure());
      }
    }

    providers.push(CPUExecutionProvider::default().into());
    providers
  }

  #[cfg(target_os = "linux")]
  fn is_cuda_available() -> bool {
    std::process::Command::new("nvidia-smi").output().map(|output| output.status.success()).unwrap_or(false)
  }
}

#[cfg(not(tarpaulin_include))]
impl OnnxBackbone {
  fn run_batch(&self, batch: Array4<f32>) -> Result<Vec<Feature>> {
    let batch_size = batch.shape()[0];
    let tensor: Value = Value::from_array(batch).map_err(CalibrationError::inference)?.into();

    let mut inputs = HashMap::new();
    inputs.insert(self.input_name.clone(), tensor);

    let mut session =
      self.session.lock().map_err(|_| CalibrationError::inference("backbone session lock poisoned"))?;
    let outputs = session.run(inputs).map_err(CalibrationError::inference)?;

    let output = outputs
      .get(self.output_name.as_str())
      .ok_or_else(|| CalibrationError::inference(format!("no '{}' output from backbone", self.output_name)))?;
    let (shape, data) = output.try_extract_tensor::<f32>().map_err(CalibrationError::inference)?;

    split_features(shape.as_ref(), data, batch_size)
  }
}

#[cfg(not(tarpaulin_include))]
impl FeatureExtractor for OnnxBackbone {
  fn extract(&self, paths: &[PathBuf]) -> Result<Vec<Feature>> {
    if paths.is_empty() {
      return Ok(Vec::new());
    }

    let batch = preprocess::prepare_batch(paths)?;
    self.run_batch(batch)
  }

  fn describe(&self) -> String {
    format!("onnx:{}", self.model_path.display())
  }
}

/// Split a backbone output of shape `[N, 512]` or `[N, 512, 1, 1]` into per-image features
pub fn split_features(shape: &[i64], data: &[f32], batch_size: usize) -> Result<Vec<Feature>> {
  let describe = || format!("{shape:?}");

  let leading = shape.first().copied().unwrap_or_default();
  let width: i64 = shape.iter().skip(1).product();
  if leading as usize != batch_size || width as usize != FEATURE_DIM {
    return Err(CalibrationError::shape_mismatch(format!("[{batch_size}, {FEATURE_DIM}]"), describe()));
  }
  if data.len() != batch_size * FEATURE_DIM {
    return Err(CalibrationError::shape_mismatch(
      format!("{} values", batch_size * FEATURE_DIM),
      format!("{} values", data.len()),
    ));
  }

  Ok(data.chunks_exact(FEATURE_DIM).map(|chunk| Feature::from(chunk.to_vec())).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_flat_output() {
    let data: Vec<f32> = (0..2 * FEATURE_DIM).map(|i| i as f32).collect();
    let features = split_features(&[2, 512], &data, 2).unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[1][0], 512.0);
  }

  #[test]
  fn test_split_pooled_output() {
    let data = vec![1.0f32; FEATURE_DIM];
    let features = split_features(&[1, 512, 1, 1], &data, 1).unwrap();
    assert_eq!(features[0].len(), FEATURE_DIM);
  }

  #[test]
  fn test_split_rejects_classifier_head() {
    let data = vec![0.0f32; 1000];
    let err = split_features(&[1, 1000], &data, 1).unwrap_err();
    assert!(matches!(err, CalibrationError::ShapeMismatch { .. }));
  }

  #[test]
  fn test_split_rejects_batch_mismatch() {
    let data = vec![0.0f32; FEATURE_DIM];
    assert!(split_features(&[1, 512], &data, 2).is_err());
  }
}
