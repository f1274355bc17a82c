//! Error taxonomy for the comment engine.
//!
//! Every variant maps onto exactly one HTTP status in `murmur-api`.
//! `NotFound` is used for missing, unpublished and (for non-admins)
//! soft-deleted targets alike, so callers cannot probe for hidden content.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed id, empty or oversized text, or a depth violation.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("authentication required")]
  AuthRequired,

  /// Banned actor (carries the stored ban reason verbatim) or a
  /// non-admin attempting an admin-only operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("rate limited; retry after {retry_after:?}")]
  RateLimited { retry_after: Duration },

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Internal`].
  pub fn internal<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Internal(Box::new(e))
  }

  pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

  pub fn not_found(what: impl Into<String>) -> Self { Self::NotFound(what.into()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
