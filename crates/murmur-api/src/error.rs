//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use murmur_core::Error;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match &self.0 {
      Error::Validation(_) => StatusCode::BAD_REQUEST,
      Error::AuthRequired => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self.0 {
      Error::Validation(m) | Error::Forbidden(m) => m.clone(),
      Error::AuthRequired => "authentication required".to_owned(),
      Error::NotFound(what) => format!("{what} not found"),
      Error::RateLimited { .. } => "too many requests; slow down".to_owned(),
      Error::Internal(e) => {
        tracing::error!(error = %e, "internal error");
        "internal server error".to_owned()
      }
    };

    let mut response = (status, Json(json!({ "error": message }))).into_response();
    if let Error::RateLimited { retry_after } = &self.0 {
      let secs = retry_after.as_millis().div_ceil(1000).max(1);
      if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
      }
    }
    response
  }
}
