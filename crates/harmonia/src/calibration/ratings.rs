//! Validated star ratings

use std::collections::{BTreeMap, HashMap};

use crate::error::{CalibrationError, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// A non-empty set of `image_id -> rating` pairs with every rating in `1..=5`.
///
/// Iterates in image id order so the aggregation sums are reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ratings(BTreeMap<String, u8>);

impl Ratings {
  /// Validate raw wire values; out-of-range values are rejected, never clamped
  pub fn new<I, K>(raw: I) -> Result<Self>
  where
    I: IntoIterator<Item = (K, i64)>,
    K: Into<String>,
  {
    let mut ratings = BTreeMap::new();
    for (image_id, rating) in raw {
      let image_id = image_id.into();
      let value = u8::try_from(rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
        .ok_or_else(|| CalibrationError::invalid_rating(image_id.as_str(), rating))?;
      ratings.insert(image_id, value);
    }

    if ratings.is_empty() {
      return Err(CalibrationError::EmptyRatings);
    }

    Ok(Self(ratings))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Always false for a constructed value; present for API symmetry with `len`
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
    self.0.iter().map(|(id, rating)| (id.as_str(), *rating))
  }
}

impl TryFrom<HashMap<String, i64>> for Ratings {
  type Error = CalibrationError;

  fn try_from(raw: HashMap<String, i64>) -> Result<Self> {
    Self::new(raw)
  }
}

impl TryFrom<BTreeMap<String, i64>> for Ratings {
  type Error = CalibrationError;

  fn try_from(raw: BTreeMap<String, i64>) -> Result<Self> {
    Self::new(raw)
  }
}
