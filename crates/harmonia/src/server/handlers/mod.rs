//! Endpoint handlers

pub mod calibration;
pub mod status;
