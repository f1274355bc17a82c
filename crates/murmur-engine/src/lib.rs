//! The comment, reaction, and notification engine.
//!
//! [`Engine`] composes any [`Store`] with any [`RateLimiter`] into the
//! operations exposed over HTTP. It is stateless per call: the only shared
//! mutable state outside the store is the limiter's watermark map.
//!
//! Write order for every mutation: actor present → not banned → input
//! well-formed → target visible → idempotent replay → cooldown → store.

mod comments;
mod notifications;
mod pagination;
mod reactions;
pub mod rate_limit;

use std::{sync::Arc, time::Duration};

use murmur_core::{
  Error, Result,
  actor::Actor,
  rate_limit::{RateLimiter, action_key},
  store::Store,
  visibility::require_writer,
};
use serde::Deserialize;

pub use rate_limit::CooldownLimiter;

/// Rate-limit action names; combined with the actor id to form the key.
pub const COMMENT_ACTION: &str = "comment";
pub const LIKE_ACTION: &str = "like";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Tunables, deserialised from the `[engine]` table of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Cooldown between two comment/reply creations by one actor.
  pub comment_cooldown_ms: u64,
  /// Cooldown between two like/unlike calls by one actor.
  pub like_cooldown_ms:    u64,
  pub max_comment_len:     usize,
  pub default_page_size:   u32,
  pub max_page_size:       u32,
  /// Characters of reply text copied into a notification.
  pub preview_len:         usize,
  /// Most notifications returned by one listing.
  pub notification_limit:  u32,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      comment_cooldown_ms: 5_000,
      like_cooldown_ms:    1_000,
      max_comment_len:     murmur_core::comment::MAX_COMMENT_LEN,
      default_page_size:   10,
      max_page_size:       50,
      preview_len:         100,
      notification_limit:  50,
    }
  }
}

impl EngineConfig {
  pub fn comment_cooldown(&self) -> Duration { Duration::from_millis(self.comment_cooldown_ms) }

  pub fn like_cooldown(&self) -> Duration { Duration::from_millis(self.like_cooldown_ms) }

  /// The longest cooldown in use; watermarks older than this are dead.
  pub fn longest_cooldown(&self) -> Duration { self.comment_cooldown().max(self.like_cooldown()) }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Shared by every request handler. Cloning is cheap.
pub struct Engine<S, L = CooldownLimiter> {
  store:   Arc<S>,
  limiter: Arc<L>,
  config:  Arc<EngineConfig>,
}

impl<S, L> Clone for Engine<S, L> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      limiter: Arc::clone(&self.limiter),
      config:  Arc::clone(&self.config),
    }
  }
}

impl<S, L> Engine<S, L>
where
  S: Store,
  L: RateLimiter,
{
  pub fn new(store: Arc<S>, limiter: Arc<L>, config: EngineConfig) -> Self {
    Self { store, limiter, config: Arc::new(config) }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Resolve a session token through the store's actor directory.
  pub async fn resolve_actor(&self, token: &str) -> Result<Option<Actor>> {
    self.store.resolve_session(token).await.map_err(Error::internal)
  }

  /// Run the cooldown gate for `action` on behalf of `actor`.
  async fn gate(&self, action: &str, actor: &Actor, cooldown: Duration) -> Result<()> {
    let key = action_key(action, &actor.id);
    let decision = self.limiter.check(&key, cooldown).await;
    if decision.allowed {
      return Ok(());
    }
    tracing::debug!(%key, retry_after_ms = decision.retry_after.as_millis() as u64, "rate limited");
    Err(Error::RateLimited { retry_after: decision.retry_after })
  }
}

/// [`require_writer`] plus a log line when a banned actor tries to write.
fn writer<'a>(actor: Option<&'a Actor>, op: &str) -> Result<&'a Actor> {
  require_writer(actor).inspect_err(|e| {
    if let (Error::Forbidden(reason), Some(a)) = (e, actor) {
      tracing::warn!(actor = %a.id, op, reason = %reason, "banned actor attempted a write");
    }
  })
}
