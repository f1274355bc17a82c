//! Handlers for comment and reply endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/{domain}/{subjectId}/comments` | `?page&limit` |
//! | `POST`   | `/{domain}/{subjectId}/comments` | Body: `{"text":"..."}` |
//! | `GET`    | `/{domain}/comments/{commentId}/replies` | Oldest first |
//! | `POST`   | `/{domain}/comments/{commentId}/replies` | Body: `{"text":"..."}` |
//! | `DELETE` | `/{domain}/comments/{commentId}` | Admin soft delete |
//!
//! Creation honours an optional `Idempotency-Key` header.

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use murmur_core::{
  Error,
  comment::{CommentPage, CommentView},
  rate_limit::RateLimiter,
  store::Store,
  visibility::require_writer,
};
use murmur_engine::Engine;
use serde::{Deserialize, Serialize};

use crate::{auth::CurrentActor, error::ApiError, paths};

pub const IDEMPOTENCY_KEY: &str = "idempotency-key";

fn idempotency_key(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
  headers
    .get(IDEMPOTENCY_KEY)
    .map(|v| {
      v.to_str()
        .map_err(|_| ApiError(Error::validation("idempotency key must be printable ASCII")))
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
  pub text: String,
}

/// Unwrap a comment body. A malformed body is a validation error, reported
/// only once the caller has passed the identity and ban checks.
fn text_body(
  body: Result<Json<TextBody>, JsonRejection>,
  actor: &CurrentActor,
) -> Result<String, ApiError> {
  match body {
    Ok(Json(body)) => Ok(body.text),
    Err(rejection) => {
      require_writer(actor.actor())?;
      Err(ApiError(Error::validation(rejection.body_text())))
    }
  }
}

// ─── Root comments ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<String>,
  pub limit: Option<String>,
}

/// `GET /{domain}/{subjectId}/comments[?page=&limit=]`
pub async fn list<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, subject_id)): Path<(String, String)>,
  Query(params): Query<PageParams>,
  actor: CurrentActor,
) -> Result<Json<CommentPage>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let subject = paths::subject(&domain, &subject_id)?;
  let page = paths::query_number(params.page.as_deref(), "page")?;
  let limit = paths::query_number(params.limit.as_deref(), "limit")?;
  Ok(Json(engine.list_roots(subject, actor.actor(), page, limit).await?))
}

#[derive(Debug, Serialize)]
pub struct CommentBody {
  pub comment: CommentView,
}

/// `POST /{domain}/{subjectId}/comments`
pub async fn create<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, subject_id)): Path<(String, String)>,
  actor: CurrentActor,
  headers: HeaderMap,
  body: Result<Json<TextBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let subject = paths::subject(&domain, &subject_id)?;
  let text = text_body(body, &actor)?;
  let comment = engine
    .create_root(subject, actor.actor(), &text, idempotency_key(&headers)?)
    .await?;
  Ok((StatusCode::CREATED, Json(CommentBody { comment })))
}

/// `DELETE /{domain}/comments/{commentId}`
pub async fn delete<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, comment_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<CommentBody>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let (domain, id) = paths::comment(&domain, &comment_id)?;
  let comment = engine.soft_delete(domain, id, actor.actor()).await?;
  Ok(Json(CommentBody { comment }))
}

// ─── Replies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RepliesBody {
  pub replies: Vec<CommentView>,
}

/// `GET /{domain}/comments/{commentId}/replies`
pub async fn list_replies<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, comment_id)): Path<(String, String)>,
  actor: CurrentActor,
) -> Result<Json<RepliesBody>, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let (domain, id) = paths::comment(&domain, &comment_id)?;
  let replies = engine.list_replies(domain, id, actor.actor()).await?;
  Ok(Json(RepliesBody { replies }))
}

#[derive(Debug, Serialize)]
pub struct ReplyBody {
  pub reply: CommentView,
}

/// `POST /{domain}/comments/{commentId}/replies`
pub async fn reply<S, L>(
  State(engine): State<Engine<S, L>>,
  Path((domain, comment_id)): Path<(String, String)>,
  actor: CurrentActor,
  headers: HeaderMap,
  body: Result<Json<TextBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  L: RateLimiter,
{
  let (domain, id) = paths::comment(&domain, &comment_id)?;
  let text = text_body(body, &actor)?;
  let reply = engine
    .create_reply(domain, id, actor.actor(), &text, idempotency_key(&headers)?)
    .await?;
  Ok((StatusCode::CREATED, Json(ReplyBody { reply })))
}
