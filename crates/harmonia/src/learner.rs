//! Parameter generator ("learner")
//!
//! A small feed-forward network that maps an aggregated feature vector to the
//! weights and bias of a per-user linear predictor. At calibration time only
//! the generated weight slice is kept, as the user's embedding.

use ndarray::{s, Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use safetensors::{Dtype, SafeTensors};
use std::path::Path;

use crate::error::{CalibrationError, Result};
use crate::vision::FEATURE_DIM;

pub const HIDDEN_DIM: usize = 256;

/// Seed of the default initialisation; every process builds the same network
const INIT_SEED: u64 = 0x4d45_5441_4642_5031;

const HIDDEN_WEIGHT: &str = "generator.0.weight";
const HIDDEN_BIAS: &str = "generator.0.bias";
const OUTPUT_WEIGHT: &str = "generator.2.weight";
const OUTPUT_BIAS: &str = "generator.2.bias";

/// Decoded generator output: weights of the personalised predictor plus its bias
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedParams {
  pub weights: Array1<f32>,
  pub bias: f32,
}

/// `Linear(in -> hidden) -> ReLU -> Linear(hidden -> in + 1)`
#[derive(Debug, Clone)]
pub struct ParameterGenerator {
  hidden_weight: Array2<f32>,
  hidden_bias: Array1<f32>,
  output_weight: Array2<f32>,
  output_bias: Array1<f32>,
}

impl ParameterGenerator {
  /// Deterministically initialised generator of the standard shape
  pub fn seeded() -> Self {
    Self::initialise(FEATURE_DIM, HIDDEN_DIM, INIT_SEED)
  }

  /// Uniform `(-1/sqrt(fan_in), 1/sqrt(fan_in))` initialisation from a seed
  pub fn initialise(in_dim: usize, hidden_dim: usize, seed: u64) -> Self {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let out_dim = in_dim + 1;

    let hidden_bound = 1.0 / (in_dim as f32).sqrt();
    let output_bound = 1.0 / (hidden_dim as f32).sqrt();

    let hidden_weight = Array2::from_shape_simple_fn((hidden_dim, in_dim), || {
      rng.random_range(-hidden_bound..hidden_bound)
    });
    let hidden_bias = Array1::from_shape_simple_fn(hidden_dim, || rng.random_range(-hidden_bound..hidden_bound));
    let output_weight = Array2::from_shape_simple_fn((out_dim, hidden_dim), || {
      rng.random_range(-output_bound..output_bound)
    });
    let output_bias = Array1::from_shape_simple_fn(out_dim, || rng.random_range(-output_bound..output_bound));

    Self { hidden_weight, hidden_bias, output_weight, output_bias }
  }

  /// Build from explicit layer parameters in `[out, in]` layout
  pub fn from_parts(
    hidden_weight: Array2<f32>,
    hidden_bias: Array1<f32>,
    output_weight: Array2<f32>,
    output_bias: Array1<f32>,
  ) -> Result<Self> {
    let (hidden_dim, in_dim) = hidden_weight.dim();
    let expected_out = in_dim + 1;

    if hidden_bias.len() != hidden_dim {
      return Err(CalibrationError::shape_mismatch(
        format!("{HIDDEN_BIAS} [{hidden_dim}]"),
        format!("[{}]", hidden_bias.len()),
      ));
    }
    if output_weight.dim() != (expected_out, hidden_dim) {
      return Err(CalibrationError::shape_mismatch(
        format!("{OUTPUT_WEIGHT} [{expected_out}, {hidden_dim}]"),
        format!("{:?}", output_weight.shape()),
      ));
    }
    if output_bias.len() != expected_out {
      return Err(CalibrationError::shape_mismatch(
        format!("{OUTPUT_BIAS} [{expected_out}]"),
        format!("[{}]", output_bias.len()),
      ));
    }

    Ok(Self { hidden_weight, hidden_bias, output_weight, output_bias })
  }

  /// Load weights exported from the trained meta-learner
  pub fn from_safetensors(path: &Path) -> Result<Self> {
    bentley::info!("Loading learner weights from {}", path.display());

    let bytes = std::fs::read(path)?;
    let tensors = SafeTensors::deserialize(&bytes).map_err(CalibrationError::weights_load)?;

    let generator = Self::from_parts(
      read_matrix(&tensors, HIDDEN_WEIGHT)?,
      read_vector(&tensors, HIDDEN_BIAS)?,
      read_matrix(&tensors, OUTPUT_WEIGHT)?,
      read_vector(&tensors, OUTPUT_BIAS)?,
    )?;

    if generator.in_dim() != FEATURE_DIM {
      return Err(CalibrationError::shape_mismatch(
        format!("learner input width {FEATURE_DIM}"),
        generator.in_dim().to_string(),
      ));
    }

    Ok(generator)
  }

  /// Load from a weights file when one is configured, otherwise use the seeded default
  pub fn load_or_seeded(path: Option<&Path>) -> Result<Self> {
    match path {
      Some(path) => Self::from_safetensors(path),
      None => {
        bentley::verbose!("No learner weights configured - using seeded initialisation");
        Ok(Self::seeded())
      }
    }
  }

  pub fn in_dim(&self) -> usize {
    self.hidden_weight.ncols()
  }

  pub fn hidden_dim(&self) -> usize {
    self.hidden_weight.nrows()
  }

  /// Run the generator and decode its output into weights and bias
  pub fn generate(&self, features: ArrayView1<f32>) -> Result<GeneratedParams> {
    if features.len() != self.in_dim() {
      return Err(CalibrationError::shape_mismatch(
        format!("[{}]", self.in_dim()),
        format!("[{}]", features.len()),
      ));
    }

    let hidden = (self.hidden_weight.dot(&features) + &self.hidden_bias).mapv_into(|v| v.max(0.0));
    let params = self.output_weight.dot(&hidden) + &self.output_bias;

    Ok(self.decode(params))
  }

  /// The generated weight slice used as the user's embedding
  pub fn user_weights(&self, features: ArrayView1<f32>) -> Result<Array1<f32>> {
    Ok(self.generate(features)?.weights)
  }

  /// Score `features` with the predictor generated from the features themselves
  pub fn predict(&self, features: ArrayView1<f32>) -> Result<f32> {
    let params = self.generate(features)?;
    Ok(features.dot(&params.weights) + params.bias)
  }

  fn decode(&self, params: Array1<f32>) -> GeneratedParams {
    let split = self.in_dim();
    GeneratedParams { weights: params.slice(s![..split]).to_owned(), bias: params[split] }
  }
}

fn read_f32(tensors: &SafeTensors, name: &str) -> Result<(Vec<usize>, Vec<f32>)> {
  let view = tensors.tensor(name).map_err(|e| CalibrationError::weights_load(format!("{name}: {e}")))?;
  if view.dtype() != Dtype::F32 {
    return Err(CalibrationError::weights_load(format!("{name}: expected F32, found {:?}", view.dtype())));
  }

  let values = view
    .data()
    .chunks_exact(4)
    .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    .collect();

  Ok((view.shape().to_vec(), values))
}

fn read_matrix(tensors: &SafeTensors, name: &str) -> Result<Array2<f32>> {
  let (shape, values) = read_f32(tensors, name)?;
  match shape.as_slice() {
    [rows, cols] => Array2::from_shape_vec((*rows, *cols), values)
      .map_err(|e| CalibrationError::weights_load(format!("{name}: {e}"))),
    other => Err(CalibrationError::shape_mismatch(format!("{name} rank 2"), format!("{other:?}"))),
  }
}

fn read_vector(tensors: &SafeTensors, name: &str) -> Result<Array1<f32>> {
  let (shape, values) = read_f32(tensors, name)?;
  match shape.as_slice() {
    [_] => Ok(Array1::from(values)),
    other => Err(CalibrationError::shape_mismatch(format!("{name} rank 1"), format!("{other:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::array;
  use tempfile::TempDir;

  /// Tiny generator: in_dim 2, hidden 2, output 3
  fn tiny() -> ParameterGenerator {
    ParameterGenerator::from_parts(
      array![[1.0, 0.0], [0.0, -1.0]],
      array![0.0, 0.5],
      array![[1.0, 1.0], [2.0, 0.0], [0.0, 3.0]],
      array![0.1, 0.2, 0.3],
    )
    .unwrap()
  }

  /// Minimal safetensors writer: u64 header length, JSON header, raw little-endian data
  fn write_safetensors(path: &Path, tensors: &[(&str, Vec<usize>, Vec<f32>)]) {
    let mut header = serde_json::Map::new();
    let mut data = Vec::new();
    for (name, shape, values) in tensors {
      let start = data.len();
      for value in values {
        data.extend_from_slice(&value.to_le_bytes());
      }
      header.insert(
        name.to_string(),
        serde_json::json!({"dtype": "F32", "shape": shape, "data_offsets": [start, data.len()]}),
      );
    }
    let header = serde_json::to_vec(&serde_json::Value::Object(header)).unwrap();

    let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&data);
    std::fs::write(path, bytes).unwrap();
  }

  #[test]
  fn test_generate_by_hand() {
    // hidden = relu([x0, -x1 + 0.5]) = relu([2, -3.5]) = [2, 0]
    // params = [2 + 0 + 0.1, 4 + 0.2, 0 + 0.3]
    let params = tiny().generate(array![2.0, 4.0].view()).unwrap();
    assert!((params.weights[0] - 2.1).abs() < 1e-6);
    assert!((params.weights[1] - 4.2).abs() < 1e-6);
    assert!((params.bias - 0.3).abs() < 1e-6);
  }

  #[test]
  fn test_predict_applies_generated_predictor() {
    // x . w + b = 2*2.1 + 4*4.2 + 0.3
    let score = tiny().predict(array![2.0, 4.0].view()).unwrap();
    assert!((score - 21.3).abs() < 1e-4);
  }

  #[test]
  fn test_seeded_shape_and_determinism() {
    let a = ParameterGenerator::seeded();
    let b = ParameterGenerator::seeded();
    assert_eq!(a.in_dim(), FEATURE_DIM);
    assert_eq!(a.hidden_dim(), HIDDEN_DIM);

    let input = Array1::<f32>::from_elem(FEATURE_DIM, 0.1);
    let pa = a.generate(input.view()).unwrap();
    let pb = b.generate(input.view()).unwrap();
    assert_eq!(pa.weights.len(), FEATURE_DIM);
    assert_eq!(pa, pb);
  }

  #[test]
  fn test_initialisation_respects_fan_in_bound() {
    let generator = ParameterGenerator::initialise(16, 4, 7);
    let bound = 1.0 / 4.0;
    assert!(generator.hidden_weight.iter().all(|w| w.abs() <= bound));
    assert!(generator.output_weight.iter().all(|w| w.abs() <= 0.5));
  }

  #[test]
  fn test_rejects_wrong_input_width() {
    let err = tiny().generate(array![1.0, 2.0, 3.0].view()).unwrap_err();
    assert!(matches!(err, CalibrationError::ShapeMismatch { .. }));
  }

  #[test]
  fn test_from_parts_checks_output_width() {
    let result = ParameterGenerator::from_parts(
      array![[1.0, 0.0], [0.0, 1.0]],
      array![0.0, 0.0],
      array![[1.0, 1.0], [1.0, 1.0]],
      array![0.0, 0.0],
    );
    assert!(result.is_err());
  }

  #[test]
  fn test_safetensors_must_match_feature_width() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("learner.safetensors");
    write_safetensors(
      &path,
      &[
        (HIDDEN_WEIGHT, vec![2, 2], vec![1.0, 0.0, 0.0, -1.0]),
        (HIDDEN_BIAS, vec![2], vec![0.0, 0.5]),
        (OUTPUT_WEIGHT, vec![3, 2], vec![1.0, 1.0, 2.0, 0.0, 0.0, 3.0]),
        (OUTPUT_BIAS, vec![3], vec![0.1, 0.2, 0.3]),
      ],
    );

    let err = ParameterGenerator::from_safetensors(&path).unwrap_err();
    assert!(matches!(err, CalibrationError::ShapeMismatch { .. }));
  }

  #[test]
  fn test_safetensors_full_width_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("learner.safetensors");
    let hidden = 4;
    let out = FEATURE_DIM + 1;

    // Hidden unit 0 copies feature 0; output row i reads hidden unit 0 with weight i
    let mut hidden_weight = vec![0.0; hidden * FEATURE_DIM];
    hidden_weight[0] = 1.0;
    let output_weight: Vec<f32> = (0..out).flat_map(|i| [i as f32, 0.0, 0.0, 0.0]).collect();

    write_safetensors(
      &path,
      &[
        (HIDDEN_WEIGHT, vec![hidden, FEATURE_DIM], hidden_weight),
        (HIDDEN_BIAS, vec![hidden], vec![0.0; hidden]),
        (OUTPUT_WEIGHT, vec![out, hidden], output_weight),
        (OUTPUT_BIAS, vec![out], vec![0.0; out]),
      ],
    );

    let generator = ParameterGenerator::load_or_seeded(Some(&path)).unwrap();
    let mut input = Array1::<f32>::zeros(FEATURE_DIM);
    input[0] = 2.0;

    let params = generator.generate(input.view()).unwrap();
    assert_eq!(params.weights[3], 6.0);
    assert_eq!(params.weights[511], 1022.0);
    assert_eq!(params.bias, 1024.0);
  }

  #[test]
  fn test_missing_tensor_is_reported_by_name() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("partial.safetensors");
    write_safetensors(&path, &[(HIDDEN_BIAS, vec![2], vec![0.0, 0.5])]);

    let err = ParameterGenerator::from_safetensors(&path).unwrap_err();
    assert!(err.to_string().contains(HIDDEN_WEIGHT));
  }
}
