//! Record table: left pane.

use kapsul_core::status::Status;
use ratatui::{
  Frame,
  layout::{Constraint, Rect},
  style::{Color, Modifier, Style},
  text::Line,
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use super::localized;
use crate::app::App;

pub fn status_color(status: Status) -> Color {
  match status {
    Status::Active => Color::Green,
    Status::Warning => Color::Yellow,
    Status::Expired => Color::Red,
    Status::NeedsRecharge => Color::Magenta,
    Status::OutOfOrder => Color::Gray,
  }
}

/// Render the filtered records into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let lang = app.lang;
  let filtered = app.filtered();
  let total = app.records.len();

  let mut title = if filtered.len() == total {
    format!(" {} ({}) ", lang.pick("کپسول‌ها", "Extinguishers"), localized(lang, total))
  } else {
    format!(
      " {} ({}/{}) ",
      lang.pick("کپسول‌ها", "Extinguishers"),
      localized(lang, filtered.len()),
      localized(lang, total)
    )
  };
  if let Some(status) = app.status_filter {
    title.push_str(&format!("[{}] ", status.label(lang)));
  }

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Search line along the bottom edge.
  if (app.search_active || !app.search.is_empty()) && inner.height > 2 {
    let search_area = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
    inner.height -= 1;
    let text = if app.search_active {
      format!("/{}_", app.search)
    } else {
      format!("/{}", app.search)
    };
    f.render_widget(
      Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
      search_area,
    );
  }

  let header = Row::new([
    lang.pick("کد", "Code"),
    lang.pick("محل", "Location"),
    lang.pick("نوع", "Type"),
    lang.pick("شارژ بعدی", "Next recharge"),
    lang.pick("وضعیت", "Status"),
  ])
  .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

  let rows = filtered.iter().map(|record| {
    Row::new(vec![
      Cell::from(record.code.clone()),
      Cell::from(record.location.clone()),
      Cell::from(record.kind.label(lang)),
      Cell::from(localized(lang, &record.next_recharge_date)),
      Cell::from(Line::styled(
        record.status.label(lang),
        Style::default().fg(status_color(record.status)),
      )),
    ])
  });

  let widths = [
    Constraint::Length(8),
    Constraint::Min(12),
    Constraint::Length(14),
    Constraint::Length(13),
    Constraint::Length(14),
  ];

  let mut state = TableState::default();
  state.select((!filtered.is_empty()).then_some(app.cursor));

  f.render_stateful_widget(
    Table::new(rows, widths).header(header).row_highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}
