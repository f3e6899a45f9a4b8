//! Event list pane — left panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use ticketmetal_core::{
  NormalizedEvent,
  format::{format_brl, format_short_date},
  source::EventSource,
};

use crate::app::{App, InputMode, Screen};

pub const UNTITLED: &str = "(sem título)";

/// Render the event list into `area`.
pub fn draw<S: EventSource>(f: &mut Frame, area: Rect, app: &App<S>) {
  let visible = app.visible_events();
  let total = app.events.len();

  let title = if visible.len() == total {
    format!(" Eventos ({total}) ")
  } else {
    format!(" Eventos ({}/{total}) ", visible.len())
  };

  let border = if app.screen == Screen::EventList {
    Color::Gray
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  let mut inner = block.inner(area);
  f.render_widget(block, area);

  if let Some(prompt) = prompt_line(app)
    && inner.height > 2
  {
    let prompt_area = Rect {
      y: inner.y + inner.height - 1,
      height: 1,
      ..inner
    };
    inner.height -= 1;
    f.render_widget(
      Paragraph::new(prompt).style(Style::default().fg(Color::Yellow)),
      prompt_area,
    );
  }

  if visible.is_empty() {
    f.render_widget(
      Paragraph::new("Nenhum evento.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = visible.iter().map(|e| list_item(e)).collect();

  let mut state = ListState::default();
  state.select(Some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Red)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

/// The active prompt, or the applied filters when not editing.
fn prompt_line<S: EventSource>(app: &App<S>) -> Option<String> {
  match app.input_mode {
    InputMode::Search => Some(format!("/{}_", app.query.text)),
    InputMode::Date => Some(format!("data: {}_", app.query.date.as_deref().unwrap_or(""))),
    InputMode::City => Some(format!("cidade: {}_", app.city_input)),
    InputMode::Normal => {
      let mut parts = Vec::new();
      if !app.query.text.is_empty() {
        parts.push(format!("/{}", app.query.text));
      }
      if let Some(date) = app.query.date.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("data: {date}"));
      }
      (!parts.is_empty()).then(|| parts.join("  "))
    }
  }
}

fn list_item(event: &NormalizedEvent) -> ListItem<'static> {
  let title = if event.title.is_empty() {
    UNTITLED.to_string()
  } else {
    event.title.clone()
  };
  let date = event
    .date
    .as_deref()
    .and_then(format_short_date)
    .unwrap_or_else(|| "data a definir".to_string());

  let badge = if event.is_free {
    Span::styled(" GRÁTIS ", Style::default().fg(Color::Black).bg(Color::Green))
  } else {
    Span::styled(format_brl(event.price), Style::default().fg(Color::Yellow))
  };

  let mut meta = vec![
    Span::styled(format!("  {date}"), Style::default().fg(Color::DarkGray)),
  ];
  if !event.city.is_empty() {
    meta.push(Span::styled(
      format!(" · {}", event.city),
      Style::default().fg(Color::DarkGray),
    ));
  }
  meta.push(Span::raw("  "));
  meta.push(badge);

  ListItem::new(vec![
    Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
    Line::from(meta),
  ])
}
