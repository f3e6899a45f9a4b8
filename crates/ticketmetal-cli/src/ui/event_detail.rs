//! Event detail pane — right panel.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};
use ticketmetal_core::{
  PurchaseFlow,
  format::{format_brl, format_long_date, price_label, venue_line},
};

use super::event_list::UNTITLED;
use crate::app::Detail;

const LABEL_WIDTH: usize = 12;

/// Render the opened event into `area`.
pub fn draw(f: &mut Frame, area: Rect, detail: &Detail) {
  let event = &detail.event;
  let title = if event.title.is_empty() {
    UNTITLED
  } else {
    event.title.as_str()
  };

  let block = Block::default()
    .title(format!(" {title} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Gray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  f.render_widget(
    Paragraph::new(lines(detail))
      .wrap(Wrap { trim: false })
      .scroll((u16::try_from(detail.scroll).unwrap_or(u16::MAX), 0)),
    inner,
  );
}

/// Number of lines the pane renders before wrapping; scrolling stops at
/// the last one.
pub fn line_count(detail: &Detail) -> usize { lines(detail).len() }

fn lines(detail: &Detail) -> Vec<Line<'static>> {
  let event = &detail.event;
  let mut lines: Vec<Line<'static>> = Vec::new();

  let when = match event.date.as_deref().and_then(format_long_date) {
    Some(date) => match &event.time {
      Some(time) if !time.is_empty() => format!("{date} ({time})"),
      _ => date,
    },
    None => "Data a definir".to_string(),
  };
  lines.push(field("Quando", when));

  let venue = venue_line(event);
  if !venue.is_empty() {
    lines.push(field("Onde", venue));
  }
  if !event.address.is_empty() {
    lines.push(field("Endereço", event.address.clone()));
  }
  lines.push(field("Preço", price_label(event)));
  if let Some(artists) = event.artists.as_deref().filter(|a| !a.is_empty()) {
    lines.push(field("Artistas", artists.to_string()));
  }
  if !event.genres.is_empty() {
    lines.push(field("Gêneros", event.genres.join(", ")));
  }
  if let Some(organizer) = &event.organizer {
    lines.push(field("Organizador", organizer.clone()));
  }
  if let Some(rating) = event.rating {
    lines.push(field("Avaliação", format!("{rating:.1} ★")));
  }

  let image = if detail.image.is_placeholder() {
    format!("{} (imagem padrão)", detail.image.src())
  } else {
    detail.image.src().to_string()
  };
  lines.push(field("Imagem", image));

  if !event.description.is_empty() {
    lines.push(Line::from(""));
    lines.push(Line::from(event.description.clone()));
  }

  lines.push(Line::from(""));
  lines.extend(purchase_panel(detail));
  lines
}

fn field(label: &str, value: String) -> Line<'static> {
  Line::from(vec![
    Span::styled(
      format!("{label:<LABEL_WIDTH$}"),
      Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ),
    Span::raw(value),
  ])
}

// ─── Purchase panel ───────────────────────────────────────────────────────────

fn purchase_panel(detail: &Detail) -> Vec<Line<'static>> {
  let heading = |text: &str| {
    Line::from(Span::styled(
      text.to_string(),
      Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
  };
  let dim = Style::default().fg(Color::DarkGray);

  match detail.event.purchase_flow() {
    PurchaseFlow::External { url, vendor } => vec![
      heading("Ingressos"),
      Line::from(vec![
        Span::raw("Vendido por "),
        Span::styled(vendor, Style::default().fg(Color::Yellow)),
      ]),
      Line::from(Span::styled(url.to_string(), dim)),
      Line::from(Span::styled("Enter mostra o link de compra", dim)),
    ],
    PurchaseFlow::Internal { available, .. } => {
      let mut lines = vec![heading("Comprar ingressos")];
      if let Some(left) = available {
        lines.push(Line::from(Span::styled(
          format!("{left} disponíveis"),
          dim,
        )));
      }
      if !detail.event.is_active {
        lines.push(Line::from("Evento indisponível"));
      } else if !detail.sales_open {
        lines.push(Line::from("Vendas encerradas"));
      } else {
        match &detail.order {
          Some(order) => {
            lines.push(Line::from(vec![
              Span::raw("Quantidade  "),
              Span::styled(
                format!("- {} +", order.quantity()),
                Style::default().add_modifier(Modifier::BOLD),
              ),
              Span::styled(format!("  (máx. {})", order.max_quantity()), dim),
            ]));
            lines.push(Line::from(vec![
              Span::raw("Total       "),
              Span::styled(
                format_brl(order.total()),
                Style::default().fg(Color::Yellow),
              ),
            ]));
          }
          None => lines.push(Line::from("Ingressos esgotados")),
        }
      }
      lines
    }
  }
}
