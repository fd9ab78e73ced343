//! Per-user artifact persistence
//!
//! Each user gets `<profiles_dir>/<user_id>/p1_visual_vector.json`. Every
//! write goes to its own uniquely named temp file in the same directory and is
//! renamed into place, so concurrent saves never share a temp file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::artifact::VisualVector;
use crate::error::{CalibrationError, Result};

pub const ARTIFACT_FILE: &str = "p1_visual_vector.json";

/// True when `value` can be used as exactly one path component
pub fn is_safe_component(value: &str) -> bool {
  !value.is_empty()
    && value != "."
    && value != ".."
    && !value.contains(['/', '\\', '\0'])
    && Path::new(value).components().count() == 1
}

/// Reject user ids that would escape the profiles directory
pub fn validate_user_id(user_id: &str) -> Result<()> {
  if is_safe_component(user_id) {
    Ok(())
  } else {
    Err(CalibrationError::invalid_user_id(user_id))
  }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
  profiles_dir: PathBuf,
}

impl ArtifactStore {
  pub fn new(profiles_dir: impl Into<PathBuf>) -> Self {
    Self { profiles_dir: profiles_dir.into() }
  }

  pub fn profiles_dir(&self) -> &Path {
    &self.profiles_dir
  }

  /// Location of a user's artifact, whether or not it exists
  pub fn artifact_path(&self, user_id: &str) -> Result<PathBuf> {
    validate_user_id(user_id)?;
    Ok(self.profiles_dir.join(user_id).join(ARTIFACT_FILE))
  }

  /// Write the artifact, replacing any previous one
  pub fn save(&self, user_id: &str, artifact: &VisualVector) -> Result<PathBuf> {
    let path = self.artifact_path(user_id)?;
    let user_dir = self.profiles_dir.join(user_id);
    fs::create_dir_all(&user_dir)?;

    let content = serde_json::to_string_pretty(artifact)?;
    let mut temp = NamedTempFile::new_in(&user_dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(&path).map_err(|e| e.error)?;

    bentley::verbose!("Wrote visual vector to {}", path.display());
    Ok(path)
  }

  /// Read a user's artifact; `None` when the user has never calibrated
  pub fn load(&self, user_id: &str) -> Result<Option<VisualVector>> {
    let path = self.artifact_path(user_id)?;
    if !path.exists() {
      return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let artifact = serde_json::from_str(&content)?;
    Ok(Some(artifact))
  }
}
