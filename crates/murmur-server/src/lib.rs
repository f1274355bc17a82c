//! Wiring for the Murmur HTTP server: configuration, the traced router, and
//! the background sweep of idle rate-limit watermarks.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use murmur_core::{rate_limit::RateLimiter, store::Store};
use murmur_engine::{CooldownLimiter, Engine, EngineConfig};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MURMUR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub engine:     EngineConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_owned(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/murmur/murmur.db"),
      engine:     EngineConfig::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the optional config file under `MURMUR_*` environment variables.
/// Nested keys use `__`, e.g. `MURMUR_ENGINE__COMMENT_COOLDOWN_MS`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("MURMUR")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app<S, L>(engine: Engine<S, L>) -> Router
where
  S: Store + 'static,
  L: RateLimiter + 'static,
{
  murmur_api::api_router(engine).layer(TraceLayer::new_for_http())
}

/// Periodically drop watermarks that can no longer reject anything.
pub fn spawn_sweeper(limiter: Arc<CooldownLimiter>, idle: Duration) -> JoinHandle<()> {
  let period = idle.max(Duration::from_secs(1));
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    loop {
      ticker.tick().await;
      limiter.sweep(idle);
    }
  })
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use murmur_store_sqlite::SqliteStore;
  use tower::ServiceExt;

  use super::*;

  #[test]
  fn config_file_overrides_defaults() {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 9000\n[engine]\ncomment_cooldown_ms = 250\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap();
    let cfg: ServerConfig = settings.try_deserialize().unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.engine.comment_cooldown_ms, 250);
    assert_eq!(cfg.engine.like_cooldown_ms, 1_000);
    assert_eq!(cfg.engine.max_page_size, 50);
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/db.sqlite")), PathBuf::from(home).join("db.sqlite"));
    assert_eq!(expand_tilde(Path::new("/abs/db")), PathBuf::from("/abs/db"));
  }

  #[tokio::test]
  async fn traced_app_serves_api() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = Engine::new(
      Arc::new(store),
      Arc::new(CooldownLimiter::new()),
      EngineConfig::default(),
    );
    let req = Request::builder()
      .uri("/posts/1/comments")
      .body(Body::empty())
      .unwrap();
    let resp = app(engine).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);
  }
}
