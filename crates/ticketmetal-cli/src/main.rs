//! `ticketmetal` — terminal storefront for the TicketMetal catalog.
//!
//! # Usage
//!
//! ```text
//! ticketmetal --url http://localhost:8000 --feed aggregated --sort price
//! ticketmetal --config ~/.config/ticketmetal/config.toml --log-file /tmp/tm.log
//! ```

mod app;
mod client;
mod ui;

use std::{
  fs::File,
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig, Feed};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use ticketmetal_core::{listing::SortKey, source::FeedQuery};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ticketmetal", about = "Terminal storefront for the TicketMetal catalog")]
struct Args {
  /// Path to a TOML config file (url, feed, page_size, city, sort).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the catalog server (default: http://localhost:8000).
  #[arg(long, env = "TICKETMETAL_URL")]
  url: Option<String>,

  /// Which event list to browse.
  #[arg(long, value_enum, env = "TICKETMETAL_FEED")]
  feed: Option<Feed>,

  /// Events fetched per page.
  #[arg(long)]
  page_size: Option<usize>,

  /// Only fetch events in this city.
  #[arg(long)]
  city: Option<String>,

  /// Initial list order: date-asc, date-desc, price or rating.
  #[arg(long)]
  sort: Option<String>,

  /// Write logs to this file. The terminal is owned by the UI, so nothing is
  /// logged without it.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  #[serde(default)]
  url:       Option<String>,
  #[serde(default)]
  feed:      Option<Feed>,
  #[serde(default)]
  page_size: Option<usize>,
  #[serde(default)]
  city:      Option<String>,
  #[serde(default)]
  sort:      Option<String>,
}

fn read_config(path: &Path) -> Result<ConfigFile> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

fn init_logging(path: &Path) -> Result<()> {
  let file = File::create(path)
    .with_context(|| format!("creating log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log_file {
    init_logging(path)?;
  }

  let file_cfg = match &args.config {
    Some(path) => read_config(path)?,
    None => ConfigFile::default(),
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or(file_cfg.url)
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    feed:     args.feed.or(file_cfg.feed).unwrap_or_default(),
  };
  let defaults = FeedQuery::default();
  let feed_query = FeedQuery {
    limit:  args
      .page_size
      .or(file_cfg.page_size)
      .filter(|n| *n > 0)
      .unwrap_or(defaults.limit),
    offset: 0,
    city:   args.city.or(file_cfg.city).filter(|c| !c.trim().is_empty()),
  };
  let sort = match args.sort.or(file_cfg.sort) {
    Some(s) => SortKey::parse(&s).context("reading --sort")?,
    None => SortKey::default(),
  };

  tracing::info!(url = %api_config.base_url, feed = %api_config.feed, "starting storefront");
  let client = ApiClient::new(api_config).context("creating API client")?;
  let mut app = App::new(client, feed_query);
  app.query.sort = sort;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // A failed first load is shown in the status bar, not fatal.
  app.load_events().await;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient>,
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
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await
    {
      break;
    }
  }

  Ok(())
}
