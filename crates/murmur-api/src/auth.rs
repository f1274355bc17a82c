//! Session extractor: resolves the caller from the `session` cookie or an
//! `Authorization: Bearer` header.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use murmur_core::{actor::Actor, rate_limit::RateLimiter, store::Store};
use murmur_engine::Engine;

use crate::error::ApiError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// The resolved caller. `None` for anonymous requests, including requests
/// carrying a token that no longer resolves.
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
  pub fn actor(&self) -> Option<&Actor> { self.0.as_ref() }
}

/// Pull the raw session token out of the request headers. A bearer token
/// wins over the cookie when both are present.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value.trim())
    .filter(|t| !t.is_empty())
}

impl<S, L> FromRequestParts<Engine<S, L>> for CurrentActor
where
  S: Store + 'static,
  L: RateLimiter + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    engine: &Engine<S, L>,
  ) -> Result<Self, Self::Rejection> {
    let Some(token) = session_token(&parts.headers) else {
      return Ok(Self(None));
    };
    Ok(Self(engine.resolve_actor(token).await?))
  }
}
