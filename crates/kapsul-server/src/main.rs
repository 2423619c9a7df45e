//! kapsul-server binary.
//!
//! Reads `kapsul.toml` (or the path given with `--config`) and `KAPSUL_*`
//! environment variables, opens the SQLite store, loads the record
//! collection, and serves the JSON API under `/api`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use kapsul_advisor::GatewayAdvisor;
use kapsul_api::AppState;
use kapsul_core::{clock::SystemClock, repository::Repository, store::ChangeFeed};
use kapsul_server::{ServerConfig, app, expand_tilde};
use kapsul_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kapsul fire extinguisher tracker server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "kapsul.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Load the collection and follow the change feed.
  let repo = Arc::new(Repository::new(Arc::clone(&store), SystemClock));
  let count = repo.load().await.context("initial load failed")?;
  tracing::info!(count, path = %store_path.display(), "records loaded");
  tokio::spawn(Arc::clone(&repo).watch(store.subscribe()));

  let advisor =
    GatewayAdvisor::new(server_cfg.advisor.clone()).context("failed to build advisory client")?;
  if server_cfg.advisor.api_key.is_none() {
    tracing::warn!("advisor.api_key is not set; advisory endpoints will answer 503");
  }

  let state = AppState {
    repo,
    advisor: Arc::new(advisor),
    config: Arc::new(server_cfg.api_config()),
  };

  let address = server_cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app(state)).await.context("server error")?;

  Ok(())
}
