//! Request context and middleware for the REST API
//!
//! Every request gets a request id; start and completion are logged with
//! method, path, status and duration.

use axum::{
  extract::Request,
  http::{HeaderMap, Method, Uri},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Request metadata available to handlers through `Extension<RequestContext>`
#[derive(Debug, Clone)]
pub struct RequestContext {
  /// Unique ID for this request
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, headers }
  }

  fn user_agent(&self) -> &str {
    self.headers.get("user-agent").and_then(|value| value.to_str().ok()).unwrap_or("none")
  }

  /// Prefix a message with the request id, method and path
  pub fn describe(&self, message: &str) -> String {
    format!("[{}] {} {} - {}", self.request_id, self.method, self.uri.path(), message)
  }

  pub fn log_info(&self, message: &str) {
    bentley::info!(&self.describe(message));
  }

  pub fn log_success(&self, message: &str) {
    bentley::success!(&self.describe(message));
  }

  pub fn log_warn(&self, message: &str) {
    bentley::warn!(&self.describe(message));
  }

  pub fn log_error(&self, message: &str) {
    bentley::error!(&self.describe(message));
  }

  pub fn log_request_start(&self) {
    bentley::verbose!(&self.describe(&format!("Request started (User-Agent: {})", self.user_agent())));
  }

  pub fn log_request_complete(&self, status_code: u16, duration_ms: f64) {
    let message = format!("Request completed (Status: {status_code}, Duration: {duration_ms:.2}ms)");
    if status_code >= 500 {
      self.log_error(&message);
    } else {
      self.log_info(&message);
    }
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
  let context =
    RequestContext::new(request.method().clone(), request.uri().clone(), request.headers().clone());

  let start_time = Instant::now();
  context.log_request_start();

  let span = tracing::info_span!("request", id = %context.request_id);
  request.extensions_mut().insert(context.clone());
  let response = next.run(request).instrument(span).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  context.log_request_complete(response.status().as_u16(), duration_ms);

  response
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_describe_includes_method_and_path() {
    let context = RequestContext::new(Method::POST, Uri::from_static("/api/calibration/submit?x=1"), HeaderMap::new());
    let line = context.describe("hello");
    assert!(line.contains("POST /api/calibration/submit - hello"));
    assert!(line.starts_with(&format!("[{}]", context.request_id)));
    assert_eq!(context.user_agent(), "none");
  }
}
