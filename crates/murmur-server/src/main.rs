//! murmur server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the comment API over HTTP.
//!
//! # Issuing a session
//!
//! Sessions normally come from the identity side. For local testing:
//!
//! ```
//! cargo run -p murmur-server --bin server -- --issue-session alice
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use murmur_engine::{CooldownLimiter, Engine};
use murmur_server::{app, expand_tilde, load_config, spawn_sweeper};
use murmur_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Murmur comment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Issue a session token for an existing actor, print it, and exit.
  #[arg(long, value_name = "ACTOR_ID")]
  issue_session: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(&cli.config).context("failed to read configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: print a session token and exit.
  if let Some(actor_id) = cli.issue_session {
    let token = store
      .issue_session(&actor_id)
      .await
      .with_context(|| format!("failed to issue a session for {actor_id:?}"))?;
    println!("{token}");
    return Ok(());
  }

  let limiter = Arc::new(CooldownLimiter::new());
  let _sweeper = spawn_sweeper(Arc::clone(&limiter), server_cfg.engine.longest_cooldown());

  let engine = Engine::new(Arc::new(store), limiter, server_cfg.engine.clone());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(engine)).await.context("server error")?;

  Ok(())
}
