//! Harmonia visual calibration
//!
//! Users rate a handful of calibration images; each image becomes a feature
//! vector, the vectors are weighted by rating and aggregated, and a small
//! parameter generator turns the aggregate into a per-user embedding that is
//! persisted as `p1_visual_vector.json`.

pub mod artifact;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod error;
pub mod learner;
pub mod server;
pub mod store;
pub mod vision;

pub use artifact::VisualVector;
pub use calibration::{CalibrationImage, Ratings, VisualService};
pub use config::ServiceConfig;
pub use error::{CalibrationError, ErrorKind, Result};
