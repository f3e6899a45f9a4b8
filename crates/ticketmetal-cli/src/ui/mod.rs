//! TUI rendering — orchestrates all panes.

pub mod event_detail;
pub mod event_list;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use ticketmetal_core::source::EventSource;

use crate::app::{App, InputMode, Screen};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S: EventSource>(f: &mut Frame, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S: EventSource>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%d/%m/%Y").to_string();

  let mut filters = vec![format!("ordem: {}", app.query.sort.label())];
  if let Some(city) = &app.feed.city {
    filters.push(format!("cidade: {city}"));
  }
  if app.feed.offset > 0 {
    filters.push(format!("página {}", app.feed.offset / app.feed.limit.max(1) + 1));
  }

  let left = Span::styled(
    " TicketMetal  ",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let middle = Span::styled(filters.join("  "), Style::default().fg(Color::Gray));
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::DarkGray));

  let used = left.width() + middle.width() + right.width();
  let pad = (area.width as usize).saturating_sub(used);

  let line = Line::from(vec![left, middle, Span::raw(" ".repeat(pad)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body<S: EventSource>(f: &mut Frame, area: Rect, app: &App<S>) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  event_list::draw(f, cols[0], app);

  match &app.detail {
    Some(detail) => event_detail::draw(f, cols[1], detail),
    None => draw_empty_detail(f, cols[1]),
  }
}

fn draw_empty_detail(f: &mut Frame, area: Rect) {
  let block = Block::default()
    .title(" Detalhes ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new("Selecione um evento e pressione Enter.")
      .style(Style::default().fg(Color::DarkGray)),
    inner,
  );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S: EventSource>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = match (app.input_mode, app.screen) {
    (InputMode::Search, _) => ("BUSCA", "Digite para filtrar  Esc limpa  Enter aplica"),
    (InputMode::Date, _) => ("DATA", "AAAA-MM-DD (prefixo)  Esc limpa  Enter aplica"),
    (InputMode::City, _) => ("CIDADE", "Enter busca no servidor  Esc cancela"),
    (InputMode::Normal, Screen::EventList) => (
      "LISTA",
      "↑↓ navegar  Enter abrir  / busca  d data  c cidade  s ordem  x limpar  n/p página  q sair",
    ),
    (InputMode::Normal, Screen::EventDetail) => (
      "EVENTO",
      "+/- quantidade  Enter comprar  ↑↓ rolar  Esc voltar  q sair",
    ),
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Red)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
