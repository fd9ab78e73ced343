//! Turning a user's star ratings into a visual preference vector

pub mod aggregate;
pub mod demo;
pub mod images;
pub mod pipeline;
pub mod ratings;

pub use images::CalibrationImage;
pub use pipeline::VisualService;
pub use ratings::Ratings;
