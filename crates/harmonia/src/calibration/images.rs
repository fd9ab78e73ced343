//! Calibration image discovery

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ServiceConfig;
use crate::store::is_safe_component;

/// Recognised image extensions, in resolution preference order
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

const IMAGE_ROUTE: &str = "/api/calibration/images";
const DEMO_PREFIX: &str = "demo_";

/// One image offered to the client for rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationImage {
  /// Image id the client submits its rating under
  pub id: String,
  pub filename: String,
  pub url: String,
}

/// Path of the on-disk image for `image_id`.
///
/// Matches the file stem exactly and the extension case-insensitively, the
/// same way listing does; `jpg` wins over `png`. Ids that are not a single
/// plain path component never resolve to a file.
pub fn find_image(calibration_dir: &Path, image_id: &str) -> Option<PathBuf> {
  if !is_safe_component(image_id) {
    return None;
  }

  let entries = std::fs::read_dir(calibration_dir).ok()?;
  let mut candidates: Vec<(usize, PathBuf)> = entries
    .filter_map(|entry| entry.ok())
    .map(|entry| entry.path())
    .filter(|path| path.is_file())
    .filter(|path| path.file_stem().and_then(|stem| stem.to_str()) == Some(image_id))
    .filter_map(|path| extension_rank(&path).map(|rank| (rank, path)))
    .collect();

  candidates.sort();
  candidates.into_iter().next().map(|(_, path)| path)
}

/// Position of the path's extension in `IMAGE_EXTENSIONS`, ignoring case
fn extension_rank(path: &Path) -> Option<usize> {
  let extension = path.extension()?.to_str()?;
  IMAGE_EXTENSIONS.iter().position(|known| extension.eq_ignore_ascii_case(known))
}

fn has_image_extension(path: &Path) -> bool {
  extension_rank(path).is_some()
}

/// Up to `count` images from the calibration directory, sorted by filename,
/// or demo placeholders when the directory holds none
pub fn list_calibration_images(calibration_dir: &Path, count: usize, config: &ServiceConfig) -> Vec<CalibrationImage> {
  let mut filenames: Vec<String> = match std::fs::read_dir(calibration_dir) {
    Ok(entries) => entries
      .filter_map(|entry| entry.ok())
      .map(|entry| entry.path())
      .filter(|path| path.is_file() && has_image_extension(path))
      .filter_map(|path| path.file_name().and_then(|name| name.to_str()).map(str::to_string))
      .collect(),
    Err(_) => Vec::new(),
  };

  if filenames.is_empty() {
    return demo_images(count, config);
  }

  filenames.sort();
  filenames
    .into_iter()
    .take(count)
    .map(|filename| {
      let id = Path::new(&filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename.as_str())
        .to_string();
      let url = format!("{IMAGE_ROUTE}/{filename}");
      CalibrationImage { id, filename, url }
    })
    .collect()
}

/// `count` placeholder entries `demo_001`, `demo_002`, ...
pub fn demo_images(count: usize, config: &ServiceConfig) -> Vec<CalibrationImage> {
  (1..=count)
    .map(|index| {
      let id = format!("{DEMO_PREFIX}{index:03}");
      CalibrationImage { filename: format!("{id}.jpg"), url: config.placeholder_url(&id), id }
    })
    .collect()
}
