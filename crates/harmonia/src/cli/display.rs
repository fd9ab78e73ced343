//! Display formatting utilities for CLI output

use colored::*;

use crate::artifact::{TraitList, VisualVector};
use crate::calibration::CalibrationImage;

const PREVIEW_LEN: usize = 4;

/// First few values of a vector plus its length
pub fn vector_preview(values: &[f32]) -> String {
  if values.is_empty() {
    return "[] (0 values)".to_string();
  }

  let head: Vec<String> = values.iter().take(PREVIEW_LEN).map(|v| format!("{v:.4}")).collect();
  let ellipsis = if values.len() > PREVIEW_LEN { ", ..." } else { "" };
  format!("[{}{}] ({} values)", head.join(", "), ellipsis, values.len())
}

fn trait_summary(list: &TraitList) -> String {
  match list {
    TraitList::Pending(_) => "pending".dimmed().to_string(),
    TraitList::Detected(traits) if traits.is_empty() => "none".to_string(),
    TraitList::Detected(traits) => traits.join(", "),
  }
}

/// Human readable summary of a visual vector
pub fn format_visual_vector(vector: &VisualVector) -> Vec<String> {
  let meta = &vector.meta;
  let model = &vector.preference_model;

  vec![
    format!("=== {} ===", meta.user_id.cyan().bold()),
    format!("Calibrated:        {}", meta.calibration_timestamp),
    format!("Images rated:      {}", meta.images_rated),
    format!("Gender:            {}", meta.gender),
    format!("Preference target: {}", meta.preference_target),
    format!("Embedding:         {}", vector_preview(&vector.self_analysis.embedding_vector)),
    format!("Ideal vector:      {}", vector_preview(&model.ideal_vector)),
    format!("Confidence:        {:.2}", model.calibration_confidence),
    format!("Mandatory traits:  {}", trait_summary(&model.attraction_triggers.mandatory_traits)),
    format!("Negative traits:   {}", trait_summary(&model.attraction_triggers.negative_traits)),
  ]
}

pub fn display_visual_vector(vector: &VisualVector) {
  for line in format_visual_vector(vector) {
    println!("{line}");
  }
}

pub fn display_images(images: &[CalibrationImage]) {
  for image in images {
    println!("{}  {}", image.id.yellow(), image.url);
  }
  println!("{} images", images.len());
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_vector_preview() {
    assert_eq!(vector_preview(&[]), "[] (0 values)");
    assert_eq!(vector_preview(&[0.5, 1.0]), "[0.5000, 1.0000] (2 values)");
    let long = vec![0.25f32; 512];
    assert_eq!(vector_preview(&long), "[0.2500, 0.2500, 0.2500, 0.2500, ...] (512 values)");
  }
}
