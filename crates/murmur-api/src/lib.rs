//! JSON HTTP API for Murmur.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`Store`] and [`RateLimiter`]. TLS and tracing layers are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", murmur_api::api_router(engine.clone()))
//! ```

pub mod auth;
pub mod comments;
pub mod error;
pub mod likes;
pub mod notifications;
pub mod paths;

use axum::{
  Router,
  routing::{delete, get, post},
};
use murmur_core::{rate_limit::RateLimiter, store::Store};
use murmur_engine::Engine;

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, L>(engine: Engine<S, L>) -> Router<()>
where
  S: Store + 'static,
  L: RateLimiter + 'static,
{
  Router::new()
    // Notifications
    .route("/notifications", get(notifications::list::<S, L>))
    .route("/notifications/read-all", post(notifications::mark_all_read::<S, L>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S, L>))
    // Comments addressed by id
    .route("/{domain}/comments/{comment_id}", delete(comments::delete::<S, L>))
    .route(
      "/{domain}/comments/{comment_id}/replies",
      get(comments::list_replies::<S, L>).post(comments::reply::<S, L>),
    )
    .route(
      "/{domain}/comments/{comment_id}/like",
      post(likes::like_comment::<S, L>).delete(likes::unlike_comment::<S, L>),
    )
    // Subjects
    .route(
      "/{domain}/{subject_id}/comments",
      get(comments::list::<S, L>).post(comments::create::<S, L>),
    )
    .route(
      "/{domain}/{subject_id}/like",
      post(likes::like_subject::<S, L>).delete(likes::unlike_subject::<S, L>),
    )
    .with_state(engine)
}
