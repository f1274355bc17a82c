//! The cooldown gate contract.
//!
//! The engine only sees this trait. The in-process implementation lives in
//! `murmur-engine`; a deployment running several processes can swap in a
//! shared backend without touching any call site.

use std::{future::Future, time::Duration};

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
  pub allowed:     bool,
  /// Zero when `allowed`.
  pub retry_after: Duration,
}

impl RateDecision {
  pub fn allow() -> Self { Self { allowed: true, retry_after: Duration::ZERO } }

  pub fn deny(retry_after: Duration) -> Self { Self { allowed: false, retry_after } }
}

pub trait RateLimiter: Send + Sync {
  /// Admit at most one call per `cooldown` for `key`.
  ///
  /// Only admitted calls move the key's watermark; rejected calls leave it
  /// untouched, so hammering the endpoint does not extend the wait.
  fn check<'a>(
    &'a self,
    key: &'a str,
    cooldown: Duration,
  ) -> impl Future<Output = RateDecision> + Send + 'a;
}

/// Key for a rate-limited action performed by one actor.
pub fn action_key(action: &str, actor_id: &str) -> String { format!("{action}:{actor_id}") }
