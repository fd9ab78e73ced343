use anyhow::{Context, Result};
use colored::*;

use crate::calibration::{Ratings, VisualService};
use crate::cli::display::{display_images, display_visual_vector};
use crate::config::ServiceConfig;

fn build_service(config: &ServiceConfig) -> Result<VisualService> {
  VisualService::new(config).context("Failed to initialise visual service")
}

/// Run a calibration for `user_id` and store the result
pub fn calibrate(
  config: &ServiceConfig,
  user_id: &str,
  rates: Vec<(String, i64)>,
  gender: Option<&str>,
  preference_target: Option<&str>,
) -> Result<()> {
  let ratings = Ratings::new(rates)?;
  let service = build_service(config)?;

  let vector = service.calibrate(user_id, &ratings, gender, preference_target)?;
  let path = service.artifact_path(user_id)?;

  println!("{} Calibrated {} from {} ratings", "✓".green(), user_id.cyan(), vector.meta.images_rated);
  display_visual_vector(&vector);
  println!("Saved to {}", path.display());
  Ok(())
}

/// Print a user's stored visual vector
pub fn show(config: &ServiceConfig, user_id: &str, json: bool) -> Result<()> {
  let service = build_service(config)?;

  match service.load(user_id)? {
    Some(vector) if json => println!("{}", serde_json::to_string_pretty(&vector)?),
    Some(vector) => display_visual_vector(&vector),
    None => println!("No visual vector found for {}", user_id.yellow()),
  }

  Ok(())
}

/// List the images a client would be offered for rating
pub fn images(config: &ServiceConfig, count: Option<usize>) -> Result<()> {
  let service = build_service(config)?;
  display_images(&service.list_calibration_images(count));
  Ok(())
}
