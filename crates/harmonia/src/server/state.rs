//! Shared application state handed to every handler

use std::sync::Arc;

use crate::calibration::VisualService;

#[derive(Clone)]
pub struct AppState {
  pub service: Arc<VisualService>,
}

impl AppState {
  pub fn new(service: VisualService) -> Self {
    Self { service: Arc::new(service) }
  }
}
