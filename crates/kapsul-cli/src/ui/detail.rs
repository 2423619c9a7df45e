//! Detail pane for the selected record.

use chrono::Local;
use kapsul_core::{extinguisher::Extinguisher, locale::Language};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{localized, table::status_color};

/// Render `record` into `area`.
pub fn draw(f: &mut Frame, area: Rect, record: &Extinguisher, lang: Language) {
  let block = Block::default()
    .title(format!(" {} ", record.code))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  f.render_widget(
    Paragraph::new(lines(record, lang)).wrap(Wrap { trim: false }),
    inner,
  );
}

fn lines(record: &Extinguisher, lang: Language) -> Vec<Line<'static>> {
  let label = |text: &str| {
    Span::styled(
      format!("{text:<16}"),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
  };
  let row = |text: &str, value: String| Line::from(vec![label(text), Span::raw(value)]);

  let updated = record.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");

  let mut out = vec![
    row(lang.pick("محل", "Location"), record.location.clone()),
    row(lang.pick("نوع", "Type"), record.kind.label(lang).to_owned()),
    row(
      lang.pick("ظرفیت", "Capacity"),
      format!("{} {}", localized(lang, &record.capacity), lang.pick("کیلوگرم", "kg")),
    ),
    row(lang.pick("آخرین شارژ", "Last recharge"), localized(lang, &record.last_recharge_date)),
    row(lang.pick("شارژ بعدی", "Next recharge"), localized(lang, &record.next_recharge_date)),
    Line::from(vec![
      label(lang.pick("وضعیت", "Status")),
      Span::styled(
        record.status.label(lang),
        Style::default().fg(status_color(record.status)),
      ),
    ]),
    row(lang.pick("بروزرسانی", "Updated"), updated.to_string()),
  ];

  if !record.notes.trim().is_empty() {
    out.push(Line::from(""));
    out.push(Line::from(label(lang.pick("یادداشت", "Notes"))));
    out.extend(record.notes.lines().map(|l| Line::from(l.to_owned())));
  }
  out
}
