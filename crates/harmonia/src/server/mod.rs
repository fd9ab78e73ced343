//! REST surface of the calibration service
//!
//! axum handlers over a shared `VisualService`, with schemars-annotated
//! request and response types.

pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod state;
pub mod types;

pub use routing::create_router;
pub use state::AppState;
