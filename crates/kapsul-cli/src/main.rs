//! `kapsul`: terminal UI for the Kapsul extinguisher tracker.
//!
//! # Usage
//!
//! ```text
//! kapsul --url http://localhost:8080 --email admin@example.com --password secret
//! kapsul --config ~/.config/kapsul/cli.toml --lang en
//! ```

mod app;
mod client;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kapsul_core::locale::Language;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kapsul", about = "Terminal UI for the Kapsul extinguisher tracker")]
struct Args {
  /// Path to a TOML config file (url, email, password, lang).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the kapsul server (default: http://localhost:8080).
  #[arg(long, env = "KAPSUL_URL")]
  url: Option<String>,

  #[arg(long, env = "KAPSUL_EMAIL")]
  email: Option<String>,

  #[arg(long, env = "KAPSUL_PASSWORD")]
  password: Option<String>,

  /// Display language: `fa` or `en`.
  #[arg(long, env = "KAPSUL_LANG")]
  lang: Option<Language>,

  /// Append logs to this file. The terminal is owned by the UI.
  #[arg(long, value_name = "FILE")]
  log: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
  url:      String,
  email:    String,
  password: String,
  lang:     Option<Language>,
}

fn non_empty(value: &str) -> Option<String> {
  (!value.is_empty()).then(|| value.to_owned())
}

fn init_logging(path: &PathBuf) -> Result<()> {
  let file = File::options()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log {
    init_logging(path)?;
  }

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| non_empty(&file_cfg.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    email:    args.email.or_else(|| non_empty(&file_cfg.email)).unwrap_or_default(),
    password: args.password.or_else(|| non_empty(&file_cfg.password)).unwrap_or_default(),
  };
  let lang = args.lang.or(file_cfg.lang).unwrap_or_default();

  let mut client = ApiClient::new(api_config)?;
  client.sign_in().await?;
  let mut app = App::new(client, lang);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = match app.reload().await {
    Ok(()) => run_event_loop(&mut terminal, &mut app).await,
    Err(e) => Err(e),
  };

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
