//! SQL schema for the catalog.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Events created on the platform.
CREATE TABLE IF NOT EXISTS events (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    title          TEXT    NOT NULL,
    description    TEXT    NOT NULL DEFAULT '',
    date           TEXT,
    location       TEXT    NOT NULL DEFAULT '',
    address        TEXT    NOT NULL DEFAULT '',
    city           TEXT    NOT NULL DEFAULT '',
    state          TEXT    NOT NULL DEFAULT '',
    price          REAL    NOT NULL DEFAULT 0,
    max_tickets    INTEGER NOT NULL DEFAULT 0,
    tickets_sold   INTEGER NOT NULL DEFAULT 0,
    image_url      TEXT,
    is_active      INTEGER NOT NULL DEFAULT 1,
    rating         REAL,
    organizer      TEXT,
    sales_end_date TEXT
);

-- Events scraped from external ticketing sites. The record itself is kept as
-- JSON; the other columns exist for lookup and ordering only.
CREATE TABLE IF NOT EXISTS eventos_rock (
    id          TEXT PRIMARY KEY,   -- hyphenated lowercase UUID, or a numeric id
    slug        TEXT UNIQUE,
    cidade      TEXT,
    starts_at   TEXT,               -- %Y-%m-%dT%H:%M:%S, UTC; NULL if unparseable
    record_json TEXT NOT NULL
);

-- Tickets issued for platform events.
CREATE TABLE IF NOT EXISTS tickets (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id      INTEGER NOT NULL REFERENCES events(id),
    ticket_number TEXT    NOT NULL UNIQUE,
    qr_code       TEXT    NOT NULL UNIQUE,   -- hyphenated lowercase UUID
    buyer         TEXT,
    price_paid    REAL    NOT NULL,
    purchased_at  TEXT    NOT NULL           -- RFC 3339
);

CREATE INDEX IF NOT EXISTS events_city_idx          ON events(city);
CREATE INDEX IF NOT EXISTS eventos_rock_starts_idx  ON eventos_rock(starts_at);
CREATE INDEX IF NOT EXISTS tickets_event_idx        ON tickets(event_id);

PRAGMA user_version = 2;
";
