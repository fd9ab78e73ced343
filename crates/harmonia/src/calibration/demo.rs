//! Deterministic synthetic features for image ids without an asset on disk

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use sha2::{Digest, Sha256};

use crate::vision::{l2_normalize, Feature, FEATURE_DIM};

/// Stable seed for an image id: the first eight bytes of its SHA-256, little endian
pub fn seed_for(image_id: &str) -> u64 {
  let digest = Sha256::digest(image_id.as_bytes());
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&digest[..8]);
  u64::from_le_bytes(bytes)
}

/// Unit-norm Gaussian feature keyed by image id.
///
/// The rating is accepted but does not influence the draw; identical ids
/// always produce identical vectors, across processes.
pub fn synthetic_feature(image_id: &str, _rating: u8) -> Feature {
  let mut rng = ChaCha8Rng::seed_from_u64(seed_for(image_id));
  let raw: Feature = (0..FEATURE_DIM).map(|_| -> f32 { StandardNormal.sample(&mut rng) }).collect();
  l2_normalize(raw)
}
