//! pt-BR presentation helpers: currency, dates and price labels.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};

use crate::{NormalizedEvent, event::parse_event_date};

const MONTHS: [&str; 12] = [
  "janeiro",
  "fevereiro",
  "março",
  "abril",
  "maio",
  "junho",
  "julho",
  "agosto",
  "setembro",
  "outubro",
  "novembro",
  "dezembro",
];

fn weekday_name(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "segunda-feira",
    Weekday::Tue => "terça-feira",
    Weekday::Wed => "quarta-feira",
    Weekday::Thu => "quinta-feira",
    Weekday::Fri => "sexta-feira",
    Weekday::Sat => "sábado",
    Weekday::Sun => "domingo",
  }
}

/// `1234.5` → `R$ 1.234,50`.
pub fn format_brl(amount: f64) -> String {
  let amount = if amount.is_finite() { amount } else { 0.0 };
  let cents = (amount.abs() * 100.0).round() as u64;
  let (whole, frac) = (cents / 100, cents % 100);

  let digits = whole.to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push('.');
    }
    grouped.push(ch);
  }

  let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
  format!("{sign}R$ {grouped},{frac:02}")
}

/// `2024-03-15T20:00:00` → `15/03/2024 20:00`; date-only input omits the time.
pub fn format_short_date(raw: &str) -> Option<String> {
  let dt = parse_event_date(raw)?;
  if is_date_only(raw) {
    Some(dt.format("%d/%m/%Y").to_string())
  } else {
    Some(dt.format("%d/%m/%Y %H:%M").to_string())
  }
}

/// `2024-03-15T20:00:00` → `sexta-feira, 15 de março de 2024 às 20:00`.
pub fn format_long_date(raw: &str) -> Option<String> {
  let dt = parse_event_date(raw)?;
  let date = long_date(&dt);
  if is_date_only(raw) {
    Some(date)
  } else {
    Some(format!("{date} às {:02}:{:02}", dt.hour(), dt.minute()))
  }
}

fn long_date(dt: &NaiveDateTime) -> String {
  format!(
    "{}, {:02} de {} de {}",
    weekday_name(dt.weekday()),
    dt.day(),
    MONTHS[dt.month0() as usize],
    dt.year()
  )
}

fn is_date_only(raw: &str) -> bool { raw.trim().len() == 10 }

/// `Grátis`, a single price, or a `min – max` range.
pub fn price_label(event: &NormalizedEvent) -> String {
  if event.is_free {
    return "Grátis".to_string();
  }
  match event.price_max {
    Some(max) => format!("{} – {}", format_brl(event.price), format_brl(max)),
    None => format_brl(event.price),
  }
}

/// `Local, Cidade - UF`, skipping empty parts.
pub fn venue_line(event: &NormalizedEvent) -> String {
  let city_state = match (event.city.is_empty(), event.state.is_empty()) {
    (false, false) => format!("{} - {}", event.city, event.state),
    (false, true) => event.city.clone(),
    (true, false) => event.state.clone(),
    (true, true) => String::new(),
  };
  [event.location.as_str(), city_state.as_str()]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}
