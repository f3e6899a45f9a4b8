//! Application state machine and event dispatcher.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ticketmetal_core::{
  NormalizedEvent, PurchaseFlow,
  checkout::{OrderDraft, receipt, sales_open},
  image::ImageSlot,
  listing::ListingQuery,
  source::{EventSource, FeedQuery, FetchError, load_event, load_listing},
  ticket::TicketOrder,
};
use tracing::{info, warn};

use crate::ui::event_detail;

pub const NOT_FOUND_MSG: &str = "Evento não encontrado";

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Focus on the event list.
  EventList,
  /// Focus on the detail pane of the opened event.
  EventDetail,
}

/// What typed characters currently edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
  Normal,
  /// Free-text search, applied as you type.
  Search,
  /// Date prefix such as `2024-03`, applied as you type.
  Date,
  /// City filter, sent to the server on Enter.
  City,
}

// ─── Detail ───────────────────────────────────────────────────────────────────

/// Everything the detail pane shows for the opened event.
#[derive(Debug, Clone)]
pub struct Detail {
  pub event:      NormalizedEvent,
  pub image:      ImageSlot,
  /// Quantity selector; `None` for outbound links and sold-out events.
  pub order:      Option<OrderDraft>,
  pub sales_open: bool,
  pub scroll:     usize,
}

impl Detail {
  fn new(event: NormalizedEvent, now: NaiveDateTime) -> Self {
    Self {
      image: ImageSlot::new(Some(&event.image_url)),
      order: OrderDraft::for_event(&event),
      sales_open: sales_open(&event, now),
      scroll: 0,
      event,
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S: EventSource> {
  pub screen: Screen,

  pub input_mode: InputMode,

  /// Buffer for the city prompt until it is submitted.
  pub city_input: String,

  /// Search text, date prefix and sort order of the list view.
  pub query: ListingQuery,

  /// Page and server-side city filter of the last fetch.
  pub feed: FeedQuery,

  /// Normalized records of the current page, in server order.
  pub events: Vec<NormalizedEvent>,

  /// Cursor position within the *filtered* list.
  pub list_cursor: usize,

  pub detail: Option<Detail>,

  /// One-line notification shown in the status bar.
  pub status_msg: String,

  pub source: Arc<S>,
}

impl<S: EventSource> App<S> {
  pub fn new(source: S, feed: FeedQuery) -> Self {
    Self {
      screen: Screen::EventList,
      input_mode: InputMode::Normal,
      city_input: String::new(),
      query: ListingQuery::default(),
      feed,
      events: Vec::new(),
      list_cursor: 0,
      detail: None,
      status_msg: String::new(),
      source: Arc::new(source),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the current page. On failure the previous list is kept and the
  /// error is shown in the status bar.
  pub async fn load_events(&mut self) {
    match load_listing(self.source.as_ref(), &self.feed).await {
      Ok(events) => {
        info!(count = events.len(), offset = self.feed.offset, "events loaded");
        self.events = events;
        self.list_cursor = 0;
        self.status_msg = if self.events.is_empty() {
          "Nenhum evento encontrado".into()
        } else {
          String::new()
        };
      }
      Err(e) => {
        warn!(error = %e, "loading events failed");
        self.status_msg = format!("Erro ao carregar eventos: {e}");
      }
    }
  }

  /// Re-fetch `key` and show it in the detail pane. A missing event returns
  /// to the list with a notification.
  pub async fn open_detail(&mut self, key: &str) {
    match load_event(self.source.as_ref(), key).await {
      Ok(event) => {
        let mut detail = Detail::new(event, Local::now().naive_local());
        if !detail.image.is_placeholder()
          && !self.source.image_reachable(detail.image.src().to_string()).await
        {
          detail.image.on_load_error();
        }
        self.detail = Some(detail);
        self.screen = Screen::EventDetail;
        self.status_msg.clear();
      }
      Err(FetchError::NotFound(_)) => {
        self.close_detail();
        self.status_msg = NOT_FOUND_MSG.into();
      }
      Err(FetchError::Source(e)) => {
        warn!(error = %e, key, "loading event failed");
        self.status_msg = format!("Erro ao carregar evento: {e}");
      }
    }
  }

  fn close_detail(&mut self) {
    self.detail = None;
    self.screen = Screen::EventList;
  }

  // ── Filtered list ─────────────────────────────────────────────────────────

  /// Events matching the search and date filter, in the chosen order.
  pub fn visible_events(&self) -> Vec<&NormalizedEvent> {
    self.query.apply(&self.events)
  }

  /// The event under the list cursor, if any.
  pub fn cursor_event(&self) -> Option<&NormalizedEvent> {
    self.visible_events().get(self.list_cursor).copied()
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.input_mode != InputMode::Normal {
      self.handle_input_key(key).await;
      return true;
    }

    match self.screen {
      Screen::EventList => self.handle_list_key(key).await,
      Screen::EventDetail => self.handle_detail_key(key).await,
    }
  }

  async fn handle_input_key(&mut self, key: KeyEvent) {
    let mode = self.input_mode;
    match key.code {
      KeyCode::Esc => {
        match mode {
          InputMode::Search => self.query.text.clear(),
          InputMode::Date => self.query.date = None,
          _ => {}
        }
        self.city_input.clear();
        self.input_mode = InputMode::Normal;
        self.list_cursor = 0;
      }
      KeyCode::Enter => {
        self.input_mode = InputMode::Normal;
        self.list_cursor = 0;
        if mode == InputMode::City {
          let city = self.city_input.trim().to_string();
          self.feed.city = (!city.is_empty()).then_some(city);
          self.feed.offset = 0;
          self.load_events().await;
        }
      }
      KeyCode::Backspace => {
        match mode {
          InputMode::Search => {
            self.query.text.pop();
          }
          InputMode::Date => {
            if let Some(date) = &mut self.query.date {
              date.pop();
            }
          }
          InputMode::City => {
            self.city_input.pop();
          }
          InputMode::Normal => {}
        }
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        match mode {
          InputMode::Search => self.query.text.push(c),
          InputMode::Date => self.query.date.get_or_insert_with(String::new).push(c),
          InputMode::City => self.city_input.push(c),
          InputMode::Normal => {}
        }
        self.list_cursor = 0;
      }
      _ => {}
    }
  }

  async fn handle_list_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.visible_events().len();
        if len > 0 && self.list_cursor + 1 < len {
          self.list_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        self.list_cursor = self.list_cursor.saturating_sub(1);
      }

      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(key) = self.cursor_event().map(|e| e.route_key().to_string()) {
          self.open_detail(&key).await;
        }
      }

      KeyCode::Char('/') => {
        self.input_mode = InputMode::Search;
        self.query.text.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('d') => {
        self.input_mode = InputMode::Date;
        self.query.date = Some(String::new());
        self.list_cursor = 0;
      }
      KeyCode::Char('c') => {
        self.input_mode = InputMode::City;
        self.city_input = self.feed.city.clone().unwrap_or_default();
      }
      KeyCode::Char('s') => {
        self.query.sort = self.query.sort.next();
        self.list_cursor = 0;
      }
      KeyCode::Char('x') => {
        self.query = ListingQuery {
          sort: self.query.sort,
          ..Default::default()
        };
        self.list_cursor = 0;
      }

      KeyCode::Char('r') => self.load_events().await,
      KeyCode::Char('n') | KeyCode::PageDown => {
        if self.events.len() >= self.feed.limit {
          self.feed.offset += self.feed.limit;
          self.load_events().await;
        }
      }
      KeyCode::Char('p') | KeyCode::PageUp => {
        if self.feed.offset > 0 {
          self.feed.offset = self.feed.offset.saturating_sub(self.feed.limit);
          self.load_events().await;
        }
      }

      _ => {}
    }
    true
  }

  async fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
    let Some(detail) = self.detail.as_mut() else {
      self.screen = Screen::EventList;
      return true;
    };

    match key.code {
      KeyCode::Char('q') => return false,

      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.close_detail(),

      KeyCode::Down | KeyCode::Char('j') => {
        let last = event_detail::line_count(detail).saturating_sub(1);
        detail.scroll = (detail.scroll + 1).min(last);
      }
      KeyCode::Up | KeyCode::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),

      KeyCode::Char('+') | KeyCode::Char('=') => {
        if let Some(order) = &mut detail.order {
          order.increment();
        }
      }
      KeyCode::Char('-') => {
        if let Some(order) = &mut detail.order {
          order.decrement();
        }
      }

      KeyCode::Enter | KeyCode::Char('b') => self.confirm_purchase().await,

      _ => {}
    }
    true
  }

  /// Act on the purchase panel: show the vendor link, explain why the event
  /// cannot be bought, or send the order and show the issued tickets.
  async fn confirm_purchase(&mut self) {
    let Some(detail) = &self.detail else {
      return;
    };
    let order = match purchase_precheck(detail) {
      Ok(order) => order,
      Err(message) => {
        self.status_msg = message;
        return;
      }
    };

    let event_id = order.event_id;
    let quantity = order.quantity;
    let key = detail.event.route_key().to_string();
    match self.source.purchase(order).await {
      Ok(Ok(tickets)) => {
        info!(event_id, quantity, "order confirmed");
        // Refresh availability before showing the receipt.
        self.open_detail(&key).await;
        self.status_msg = receipt(&tickets);
      }
      Ok(Err(rejection)) => {
        info!(event_id, %rejection, "order refused");
        self.status_msg = rejection.to_string();
      }
      Err(e) => {
        warn!(error = %e, event_id, "purchase failed");
        self.status_msg = format!("Erro ao comprar ingressos: {e}");
      }
    }
  }
}

/// The order to send for the opened event, or the notification to show
/// instead.
fn purchase_precheck(detail: &Detail) -> Result<TicketOrder, String> {
  match detail.event.purchase_flow() {
    PurchaseFlow::External { url, vendor } => Err(format!("Comprar em {vendor}: {url}")),
    PurchaseFlow::Internal { .. } if !detail.event.is_active => {
      Err("Evento indisponível".to_string())
    }
    PurchaseFlow::Internal { .. } if !detail.sales_open => Err("Vendas encerradas".to_string()),
    PurchaseFlow::Internal { .. } => {
      let order = detail
        .order
        .as_ref()
        .ok_or_else(|| "Ingressos esgotados".to_string())?;
      let event_id = detail
        .event
        .id
        .parse::<i64>()
        .map_err(|_| "Evento indisponível".to_string())?;
      Ok(order.order(event_id))
    }
  }
}
