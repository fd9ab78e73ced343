//! Image preprocessing matching the backbone's training distribution

use image::{imageops::FilterType, DynamicImage, ImageReader};
use ndarray::{Array3, Array4, Axis};
use std::path::Path;

use crate::error::{CalibrationError, Result};

/// Square input resolution of the backbone
pub const INPUT_SIZE: u32 = 224;

/// ImageNet per-channel mean (RGB)
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel standard deviation (RGB)
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Open and decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage> {
  let reader = ImageReader::open(path)
    .and_then(|reader| reader.with_guessed_format())
    .map_err(|source| CalibrationError::ImageOpen { path: path.to_path_buf(), source })?;

  reader.decode().map_err(|source| CalibrationError::ImageDecode { path: path.to_path_buf(), source })
}

/// Resize to `INPUT_SIZE` square, convert to RGB and normalise into a CHW tensor
pub fn to_tensor(image: &DynamicImage) -> Array3<f32> {
  let resized = image.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
  let rgb = resized.to_rgb8();
  let size = INPUT_SIZE as usize;

  let mut tensor = Array3::<f32>::zeros((3, size, size));
  for (x, y, pixel) in rgb.enumerate_pixels() {
    for channel in 0..3 {
      let value = pixel[channel] as f32 / 255.0;
      tensor[[channel, y as usize, x as usize]] =
        (value - CHANNEL_MEAN[channel]) / CHANNEL_STD[channel];
    }
  }

  tensor
}

/// Stack CHW tensors into one NCHW batch
pub fn batch(tensors: &[Array3<f32>]) -> Result<Array4<f32>> {
  let views: Vec<_> = tensors.iter().map(|tensor| tensor.view()).collect();
  ndarray::stack(Axis(0), &views)
    .map_err(|e| CalibrationError::shape_mismatch("[N, 3, 224, 224]", e.to_string()))
}

/// Load every path and build the backbone input batch
pub fn prepare_batch<P: AsRef<Path>>(paths: &[P]) -> Result<Array4<f32>> {
  let tensors = paths
    .iter()
    .map(|path| load_image(path.as_ref()).map(|image| to_tensor(&image)))
    .collect::<Result<Vec<_>>>()?;

  batch(&tensors)
}
