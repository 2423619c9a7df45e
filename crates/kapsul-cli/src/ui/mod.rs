//! TUI rendering: header, dashboard strip, table and detail panes, status bar.

pub mod detail;
pub mod table;

use kapsul_core::{date::persian_today, locale::Language, numerals::to_persian_numerals};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Length(1), // dashboard counters
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_counters(f, rows[1], app);
  draw_body(f, rows[2], app);
  draw_status(f, rows[3], app);
}

/// Digits in the display language.
pub(crate) fn localized(lang: Language, value: impl std::fmt::Display) -> String {
  match lang {
    Language::Fa => to_persian_numerals(value),
    Language::En => value.to_string(),
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let today = if app.dashboard.today.is_empty() {
    persian_today()
  } else {
    app.dashboard.today.clone()
  };

  let left = Span::styled(
    format!(
      " kapsul  {}",
      app.lang.pick("مدیریت کپسول‌های آتش‌نشانی", "Fire extinguisher tracker")
    ),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(
    format!("{} ", localized(app.lang, today)),
    Style::default().fg(Color::Gray),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::DarkGray)),
    area,
  );
}

// ─── Counters ─────────────────────────────────────────────────────────────────

fn draw_counters(f: &mut Frame, area: Rect, app: &App) {
  let s = &app.dashboard.summary;
  let lang = app.lang;
  let counter = |label: &str, n: usize, color: Color| {
    Span::styled(
      format!(" {label}: {} ", localized(lang, n)),
      Style::default().fg(color),
    )
  };

  let line = Line::from(vec![
    counter(lang.pick("کل", "Total"), s.total, Color::White),
    counter(lang.pick("فعال", "Active"), s.active, Color::Green),
    counter(lang.pick("هشدار", "Warning"), s.warning, Color::Yellow),
    counter(lang.pick("منقضی", "Expired"), s.expired, Color::Red),
    counter(lang.pick("نیاز به شارژ", "Recharge"), s.needs_recharge, Color::Magenta),
    counter(lang.pick("خراب", "Out of order"), s.out_of_order, Color::Gray),
    counter(lang.pick("نیازمند توجه", "Attention"), app.dashboard.attention, Color::LightRed),
  ]);
  f.render_widget(Paragraph::new(line), area);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  // Table on the left (65%), detail on the right (35%).
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
    .split(area);

  table::draw(f, cols[0], app);

  match app.selected() {
    Some(record) => detail::draw(f, cols[1], record, app.lang),
    None => draw_empty_detail(f, cols[1], app.lang),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect, lang: Language) {
  let block = Block::default()
    .title(format!(" {} ", lang.pick("جزئیات", "Detail")))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(lang.pick("کپسولی یافت نشد", "No extinguishers found"))
      .style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = if app.search_active {
    ("SEARCH", "Type to filter  Enter done  Esc clear")
  } else {
    (
      "NORMAL",
      "↑↓/jk move  / search  s status  r reload  e export  Esc reset  q quit",
    )
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode_label} "),
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
  ]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
