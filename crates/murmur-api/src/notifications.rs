//! Handlers for the caller's own notifications.

use axum::{
  Json,
  extract::{Path, State},
};
use murmur_core::{
  notification::{MarkedRead, NotificationList},
  rate_limit::RateLimiter,
  store::Store,
  subject::parse_id,
};
use murmur_engine::Engine;
use serde::Serialize;

use crate::{auth::CurrentActor, error::ApiError};

/// `GET /notifications`
pub async fn list<S, L>(
  State(engine): State<Engine<S, L>>,
  actor: CurrentActor,
) -> Result<Json<NotificationList>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  Ok(Json(engine.notifications(actor.actor()).await?))
}

/// `POST /notifications/{id}/read`
pub async fn mark_read<S, L>(
  State(engine): State<Engine<S, L>>,
  Path(id): Path<String>,
  actor: CurrentActor,
) -> Result<Json<MarkedRead>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let id = parse_id(&id, "notification")?;
  Ok(Json(engine.mark_read(id, actor.actor()).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllBody {
  pub unread_count: u64,
  pub updated:      u64,
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S, L>(
  State(engine): State<Engine<S, L>>,
  actor: CurrentActor,
) -> Result<Json<ReadAllBody>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let updated = engine.mark_all_read(actor.actor()).await?;
  Ok(Json(ReadAllBody { unread_count: 0, updated }))
}
