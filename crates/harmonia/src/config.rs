//! Service configuration
//!
//! Resolution order: explicit file, then `harmonia.json` or
//! `.harmonia/config.json` in the working directory, then defaults.
//! Environment overrides are applied on top of whichever was found.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "HARMONIA_DATA_DIR";
pub const BACKBONE_MODEL_ENV: &str = "HARMONIA_BACKBONE_MODEL";
pub const LEARNER_WEIGHTS_ENV: &str = "HARMONIA_LEARNER_WEIGHTS";

const CONFIG_PATHS: [&str; 2] = ["harmonia.json", ".harmonia/config.json"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
  /// Root of all service data (profiles and calibration images live below it)
  #[serde(default = "default_data_dir")]
  pub data_dir: PathBuf,

  /// ONNX file of the feature backbone (classifier head removed)
  #[serde(default)]
  pub backbone_model: Option<PathBuf>,

  /// Safetensors file with the parameter generator's weights
  #[serde(default)]
  pub learner_weights: Option<PathBuf>,

  /// URL template for demo placeholder images; `{id}` is substituted
  #[serde(default = "default_placeholder_image_url")]
  pub placeholder_image_url: String,

  /// Number of calibration images listed when the caller does not ask for a count
  #[serde(default = "default_image_count")]
  pub default_image_count: usize,

  /// Upper bound on any requested image count
  #[serde(default = "default_max_image_count")]
  pub max_image_count: usize,
}

fn default_data_dir() -> PathBuf {
  dirs::data_dir().map(|dir| dir.join("harmonia")).unwrap_or_else(|| PathBuf::from("data"))
}

fn default_placeholder_image_url() -> String {
  "https://picsum.photos/seed/{id}/512/512".to_string()
}

fn default_image_count() -> usize {
  20
}

fn default_max_image_count() -> usize {
  200
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      backbone_model: None,
      learner_weights: None,
      placeholder_image_url: default_placeholder_image_url(),
      default_image_count: default_image_count(),
      max_image_count: default_max_image_count(),
    }
  }
}

impl ServiceConfig {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ServiceConfig = serde_json::from_str(&content)
      .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
  }

  /// Load configuration from an explicit path, the working directory, or defaults,
  /// then apply environment overrides
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => Self::discover()?,
    };
    config.apply_env();
    Ok(config)
  }

  fn discover() -> Result<Self> {
    for path in &CONFIG_PATHS {
      if Path::new(path).exists() {
        return Self::load_from_file(path);
      }
    }

    Ok(Self::default())
  }

  /// Apply `HARMONIA_*` environment overrides
  pub fn apply_env(&mut self) {
    if let Some(dir) = env_path(DATA_DIR_ENV) {
      self.data_dir = dir;
    }
    if let Some(model) = env_path(BACKBONE_MODEL_ENV) {
      self.backbone_model = Some(model);
    }
    if let Some(weights) = env_path(LEARNER_WEIGHTS_ENV) {
      self.learner_weights = Some(weights);
    }
  }

  /// Save configuration to a file
  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Directory holding one sub-directory per user
  pub fn profiles_dir(&self) -> PathBuf {
    self.data_dir.join("profiles")
  }

  /// Directory holding the shared calibration images
  pub fn calibration_dir(&self) -> PathBuf {
    self.data_dir.join("global_calibration")
  }

  /// Placeholder URL for a demo image id
  pub fn placeholder_url(&self, id: &str) -> String {
    self.placeholder_image_url.replace("{id}", id)
  }
}

fn env_path(key: &str) -> Option<PathBuf> {
  std::env::var_os(key).filter(|value| !value.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn test_default_paths() {
    let config = ServiceConfig { data_dir: PathBuf::from("/srv/harmonia"), ..Default::default() };
    assert_eq!(config.profiles_dir(), PathBuf::from("/srv/harmonia/profiles"));
    assert_eq!(config.calibration_dir(), PathBuf::from("/srv/harmonia/global_calibration"));
    assert_eq!(config.default_image_count, 20);
    assert_eq!(config.max_image_count, 200);
  }

  #[test]
  fn test_placeholder_url_substitution() {
    let config = ServiceConfig::default();
    assert_eq!(config.placeholder_url("demo_003"), "https://picsum.photos/seed/demo_003/512/512");
  }

  #[test]
  #[serial]
  fn test_load_from_file_with_partial_fields() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("harmonia.json");
    std::fs::write(&path, r#"{"data_dir": "/tmp/harmonia-test", "default_image_count": 5}"#)?;

    let config = ServiceConfig::load_from_file(&path)?;
    assert_eq!(config.data_dir, PathBuf::from("/tmp/harmonia-test"));
    assert_eq!(config.default_image_count, 5);
    assert!(config.backbone_model.is_none());
    assert_eq!(config.placeholder_image_url, default_placeholder_image_url());
    Ok(())
  }

  #[test]
  #[serial]
  fn test_env_overrides_file() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("config.json");
    ServiceConfig { data_dir: PathBuf::from("/from/file"), ..Default::default() }.save_to_file(&path)?;

    std::env::set_var(DATA_DIR_ENV, temp.path());
    std::env::set_var(LEARNER_WEIGHTS_ENV, "/models/learner.safetensors");
    let config = ServiceConfig::load(Some(&path));
    std::env::remove_var(DATA_DIR_ENV);
    std::env::remove_var(LEARNER_WEIGHTS_ENV);

    let config = config?;
    assert_eq!(config.data_dir, temp.path());
    assert_eq!(config.learner_weights, Some(PathBuf::from("/models/learner.safetensors")));
    Ok(())
  }

  #[test]
  #[serial]
  fn test_missing_explicit_file_is_an_error() {
    let result = ServiceConfig::load(Some(Path::new("/nonexistent/harmonia.json")));
    assert!(result.is_err());
  }
}
