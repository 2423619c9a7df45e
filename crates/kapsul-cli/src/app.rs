//! Application state machine and event dispatcher.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kapsul_core::{
  extinguisher::Extinguisher, locale::Language, status::Status, views::RecordFilter,
};
use tracing::{info, warn};

use crate::client::{ApiClient, Dashboard};

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// All records, newest first.
  pub records: Vec<Extinguisher>,

  pub dashboard: Dashboard,

  /// Current search text (code or location).
  pub search: String,

  /// Whether the user is typing a search query.
  pub search_active: bool,

  /// `None` shows every status.
  pub status_filter: Option<Status>,

  /// Cursor position within the *filtered* record list.
  pub cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub lang: Language,

  /// Where `e` writes the export.
  pub export_dir: PathBuf,

  pub client: ApiClient,
}

impl App {
  pub fn new(client: ApiClient, lang: Language) -> Self {
    Self {
      records: Vec::new(),
      dashboard: Dashboard::default(),
      search: String::new(),
      search_active: false,
      status_filter: None,
      cursor: 0,
      status_msg: String::new(),
      lang,
      export_dir: PathBuf::from("."),
      client,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the records and the dashboard.
  pub async fn reload(&mut self) -> anyhow::Result<()> {
    self.status_msg = self.lang.pick("در حال بارگذاری…", "Loading…").into();
    let loaded = async {
      let records = self.client.list_extinguishers().await?;
      let dashboard = self.client.dashboard().await?;
      anyhow::Ok((records, dashboard))
    }
    .await;

    match loaded {
      Ok((records, dashboard)) => {
        info!(count = records.len(), "records loaded");
        self.records = records;
        self.dashboard = dashboard;
        self.clamp_cursor();
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "reload failed");
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Download the CSV export into [`export_dir`](Self::export_dir).
  async fn export(&mut self) {
    let result = async {
      let download = self.client.export(self.lang).await?;
      let path = self.export_dir.join(&download.filename);
      tokio::fs::write(&path, &download.bytes).await?;
      anyhow::Ok(path)
    }
    .await;

    self.status_msg = match result {
      Ok(path) => {
        info!(path = %path.display(), "export written");
        format!("{} {}", self.lang.pick("ذخیره شد:", "Saved:"), path.display())
      }
      Err(e) => {
        warn!(error = %e, "export failed");
        format!("Error: {e}")
      }
    };
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  pub fn filter(&self) -> RecordFilter {
    RecordFilter {
      search: (!self.search.is_empty()).then(|| self.search.clone()),
      status: self.status_filter,
    }
  }

  /// Records matching the current search and status filter.
  pub fn filtered(&self) -> Vec<&Extinguisher> { self.filter().apply(&self.records) }

  /// The record under the cursor, if any.
  pub fn selected(&self) -> Option<&Extinguisher> { self.filtered().get(self.cursor).copied() }

  fn clamp_cursor(&mut self) {
    let len = self.filtered().len();
    self.cursor = self.cursor.min(len.saturating_sub(1));
  }

  /// Step through every status, then back to "all".
  fn cycle_status_filter(&mut self) {
    self.status_filter = match self.status_filter {
      None => Some(Status::ALL[0]),
      Some(current) => Status::ALL
        .iter()
        .position(|s| *s == current)
        .and_then(|i| Status::ALL.get(i + 1))
        .copied(),
    };
    self.cursor = 0;
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    // Search input mode: all printable keys go into the search string.
    if self.search_active {
      self.handle_search_key(key);
      return Ok(true);
    }

    match key.code {
      KeyCode::Char('q') => return Ok(false),

      KeyCode::Down | KeyCode::Char('j') => {
        if self.cursor + 1 < self.filtered().len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.cursor = self.cursor.saturating_sub(1);
      }

      KeyCode::Char('/') => {
        self.search_active = true;
        self.cursor = 0;
      }
      KeyCode::Esc => {
        self.search.clear();
        self.status_filter = None;
        self.cursor = 0;
      }
      KeyCode::Char('s') => self.cycle_status_filter(),

      // A failed reload is shown in the status bar, not fatal.
      KeyCode::Char('r') => {
        let _ = self.reload().await;
      }
      KeyCode::Char('e') => self.export().await,

      _ => {}
    }
    Ok(true)
  }

  fn handle_search_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.search_active = false;
        self.search.clear();
      }
      KeyCode::Enter => self.search_active = false,
      KeyCode::Backspace => {
        self.search.pop();
      }
      KeyCode::Char(c) => self.search.push(c),
      _ => {}
    }
    self.cursor = 0;
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::client::ApiConfig;

  fn record(code: &str, location: &str, status: Status) -> Extinguisher {
    serde_json::from_value(serde_json::json!({
      "id": "00000000-0000-0000-0000-000000000000",
      "code": code,
      "location": location,
      "type": "powder",
      "capacity": "6",
      "last_recharge_date": "1403/06/20",
      "next_recharge_date": "1404/06/20",
      "status": status,
      "notes": "",
      "created_at": Utc::now(),
      "updated_at": Utc::now(),
    }))
    .unwrap()
  }

  fn app() -> App {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".into(),
      email:    String::new(),
      password: String::new(),
    })
    .unwrap();
    let mut app = App::new(client, Language::En);
    app.records = vec![
      record("FE-003", "Kitchen", Status::Expired),
      record("FE-002", "Warehouse", Status::Warning),
      record("FE-001", "Lobby", Status::Active),
    ];
    app
  }

  fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  #[tokio::test]
  async fn search_narrows_the_list() {
    let mut app = app();
    app.handle_key(key(KeyCode::Char('/'))).await.unwrap();
    // 'q' is text while typing a search, not quit.
    for c in "wareq".chars() {
      assert!(app.handle_key(key(KeyCode::Char(c))).await.unwrap());
    }
    app.handle_key(key(KeyCode::Backspace)).await.unwrap();
    app.handle_key(key(KeyCode::Enter)).await.unwrap();
    assert_eq!(app.search, "ware");
    assert_eq!(app.filtered().len(), 1);
    assert_eq!(app.selected().unwrap().code, "FE-002");

    app.handle_key(key(KeyCode::Esc)).await.unwrap();
    assert_eq!(app.filtered().len(), 3);
  }

  #[tokio::test]
  async fn status_filter_cycles_back_to_all() {
    let mut app = app();
    let mut seen = Vec::new();
    for _ in 0..=Status::ALL.len() {
      app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
      seen.push(app.status_filter);
    }
    assert_eq!(seen[0], Some(Status::ALL[0]));
    assert_eq!(seen[Status::ALL.len()], None);

    app.status_filter = Some(Status::Expired);
    assert_eq!(app.filtered().len(), 1);
    assert_eq!(app.filtered()[0].code, "FE-003");
  }

  #[tokio::test]
  async fn cursor_stays_in_bounds() {
    let mut app = app();
    for _ in 0..10 {
      app.handle_key(key(KeyCode::Down)).await.unwrap();
    }
    assert_eq!(app.cursor, 2);
    for _ in 0..10 {
      app.handle_key(key(KeyCode::Char('k'))).await.unwrap();
    }
    assert_eq!(app.cursor, 0);
  }

  #[tokio::test]
  async fn q_and_ctrl_c_quit() {
    let mut app = app();
    assert!(!app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(!app.handle_key(ctrl_c).await.unwrap());
  }
}
