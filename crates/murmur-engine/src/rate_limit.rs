//! In-process cooldown limiter.
//!
//! Keeps the last admitted instant per key for the life of the process.
//! Suitable for a single server; several replicas need a shared backend
//! behind the same [`RateLimiter`] trait.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
  time::Duration,
};

use murmur_core::rate_limit::{RateDecision, RateLimiter};
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct CooldownLimiter {
  watermarks: Mutex<HashMap<String, Instant>>,
}

impl CooldownLimiter {
  pub fn new() -> Self { Self::default() }

  /// Drop watermarks older than `idle`. Returns how many were removed.
  pub fn sweep(&self, idle: Duration) -> usize {
    let now = Instant::now();
    let mut watermarks = self.watermarks.lock().unwrap_or_else(PoisonError::into_inner);
    let before = watermarks.len();
    watermarks.retain(|_, at| now.saturating_duration_since(*at) < idle);
    let removed = before - watermarks.len();
    if removed > 0 {
      tracing::debug!(removed, "swept idle rate-limit watermarks");
    }
    removed
  }

  pub fn len(&self) -> usize {
    self.watermarks.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl RateLimiter for CooldownLimiter {
  async fn check(&self, key: &str, cooldown: Duration) -> RateDecision {
    let now = Instant::now();
    let mut watermarks = self.watermarks.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(last) = watermarks.get(key) {
      let elapsed = now.saturating_duration_since(*last);
      if elapsed < cooldown {
        return RateDecision::deny(cooldown - elapsed);
      }
    }

    watermarks.insert(key.to_owned(), now);
    RateDecision::allow()
  }
}
