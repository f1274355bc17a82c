//! Handlers for like endpoints. Both verbs return `{likeCount, likedByMe}`.

use axum::{
  Json,
  extract::{Path, State},
};
use murmur_core::{reaction::LikeState, rate_limit::RateLimiter, store::Store};
use murmur_engine::Engine;

use crate::{auth::CurrentActor, error::ApiError, paths};

/// `POST /{domain}/comments/{commentId}/like`
pub async fn like_comment<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, comment_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<LikeState>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let (domain, id) = paths::comment(&domain, &comment_id)?;
  Ok(Json(engine.like_comment(domain, id, actor.actor()).await?))
}

/// `DELETE /{domain}/comments/{commentId}/like`
pub async fn unlike_comment<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, comment_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<LikeState>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let (domain, id) = paths::comment(&domain, &comment_id)?;
  Ok(Json(engine.unlike_comment(domain, id, actor.actor()).await?))
}

/// `POST /{domain}/{subjectId}/like`
pub async fn like_subject<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, subject_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<LikeState>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let subject = paths::subject(&domain, &subject_id)?;
  Ok(Json(engine.like_subject(subject, actor.actor()).await?))
}

/// `DELETE /{domain}/{subjectId}/like`
pub async fn unlike_subject<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, subject_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<LikeState>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let subject = paths::subject(&domain, &subject_id)?;
  Ok(Json(engine.unlike_subject(subject, actor.actor()).await?))
}
