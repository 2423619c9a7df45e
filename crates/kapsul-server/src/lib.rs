//! Process wiring for the Kapsul server: configuration and the top-level
//! router.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use axum::Router;
use kapsul_advisor::{Advisor, AdvisorConfig};
use kapsul_api::{ApiConfig, AppState, Backend, api_router};
use kapsul_core::{clock::Clock, locale::Language};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `kapsul.toml` and
/// `KAPSUL_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub admin_emails:      Vec<String>,
  pub session_ttl_hours: i64,
  pub default_language:  Language,
  pub advisor:           AdvisorConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let api = ApiConfig::default();
    Self {
      host:              "127.0.0.1".to_owned(),
      port:              8080,
      store_path:        PathBuf::from("~/.local/share/kapsul/kapsul.db"),
      admin_emails:      api.admin_emails,
      session_ttl_hours: api.session_ttl_hours,
      default_language:  api.default_language,
      advisor:           AdvisorConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional TOML file at `path` under the environment.
  ///
  /// Nested keys use `__`, e.g. `KAPSUL_ADVISOR__API_KEY`. `KAPSUL_ADMIN_EMAILS`
  /// is a comma-separated list.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("KAPSUL")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("admin_emails")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn api_config(&self) -> ApiConfig {
    ApiConfig {
      admin_emails:      self.admin_emails.iter().map(|e| e.trim().to_lowercase()).collect(),
      session_ttl_hours: self.session_ttl_hours,
      default_language:  self.default_language,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
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

/// The API mounted under `/api`, with request tracing.
pub fn app<S, C, A>(state: AppState<S, C, A>) -> Router
where
  S: Backend,
  C: Clock + 'static,
  A: Advisor + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}
