//! Command line front end: run calibrations offline against a data directory

pub mod commands;
pub mod display;

/// Parse a `--rate image_id=stars` argument
pub fn parse_rating(raw: &str) -> Result<(String, i64), String> {
  let (image_id, rating) = raw.split_once('=').ok_or_else(|| format!("expected IMAGE_ID=RATING, got '{raw}'"))?;

  let image_id = image_id.trim();
  if image_id.is_empty() {
    return Err(format!("missing image id in '{raw}'"));
  }

  let rating = rating.trim().parse::<i64>().map_err(|e| format!("invalid rating in '{raw}': {e}"))?;
  Ok((image_id.to_string(), rating))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_rating() {
    assert_eq!(parse_rating("calib_001=5"), Ok(("calib_001".to_string(), 5)));
    assert_eq!(parse_rating(" a = 0 "), Ok(("a".to_string(), 0)));
    assert!(parse_rating("calib_001").is_err());
    assert!(parse_rating("=3").is_err());
    assert!(parse_rating("a=five").is_err());
  }
}
