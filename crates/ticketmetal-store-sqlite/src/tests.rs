//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone as _, Utc};
use ticketmetal_core::{
  raw::{AggregatedEvent, AggregatedId, InternalEvent},
  store::{CatalogQuery, EventStore, NewEvent},
  ticket::{SaleRejection, TicketOrder},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn submission(title: &str, city: &str) -> NewEvent {
  NewEvent {
    title:          title.into(),
    description:    String::new(),
    date:           "2024-03-15T20:00:00".into(),
    location:       "Parque da Cidade".into(),
    address:        String::new(),
    city:           city.into(),
    state:          "SP".into(),
    price:          50.0,
    max_tickets:    500,
    image_url:      None,
    organizer:      Some("Produtora XYZ".into()),
    sales_end_date: None,
  }
}

fn aggregated(slug: &str, date: Option<&str>, city: &str) -> AggregatedEvent {
  let mut event = AggregatedEvent::new(Uuid::new_v4());
  event.slug = Some(slug.into());
  event.titulo = Some(slug.to_uppercase());
  event.data_formatada = date.map(str::to_string);
  event.cidade = Some(city.into());
  event.generos = vec!["Heavy Metal".into()];
  event
}

fn slugs(events: &[AggregatedEvent]) -> Vec<String> {
  events.iter().filter_map(|e| e.slug.clone()).collect()
}

// ─── Internal events ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_event() {
  let s = store().await;

  let created = s.create_event(submission("Festival", "São Paulo")).await.unwrap();
  assert_eq!(created.tickets_sold, 0);
  assert!(created.is_active);

  let fetched = s.get_event(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_rejects_invalid_submissions() {
  let s = store().await;
  let mut input = submission("Festival", "São Paulo");
  input.price = -10.0;

  let err = s.create_event(input).await.unwrap_err();
  assert!(matches!(err, Error::Core(_)));
  assert!(s.list_events(CatalogQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_event_missing_returns_none() {
  let s = store().await;
  assert!(s.get_event(42).await.unwrap().is_none());
}

#[tokio::test]
async fn list_events_pages_and_filters_by_city() {
  let s = store().await;
  for (title, city) in [
    ("Um", "São Paulo"),
    ("Dois", "Rio de Janeiro"),
    ("Três", "São Paulo"),
  ] {
    s.create_event(submission(title, city)).await.unwrap();
  }

  let all = s.list_events(CatalogQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let sp = s
    .list_events(CatalogQuery {
      city: Some("São Paulo".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  let titles: Vec<_> = sp.iter().map(|e| e.title.as_str()).collect();
  assert_eq!(titles, ["Um", "Três"]);

  let second_page = s
    .list_events(CatalogQuery {
      limit: Some(1),
      offset: Some(1),
      city: None,
    })
    .await
    .unwrap();
  assert_eq!(second_page.len(), 1);
  assert_eq!(second_page[0].title, "Dois");
}

#[tokio::test]
async fn restore_keeps_id_and_counters() {
  let s = store().await;
  let event: InternalEvent = serde_json::from_value(serde_json::json!({
    "id": 7,
    "title": "Workshop de Tecnologia",
    "date": "2024-03-20T14:00:00",
    "price": 30.0,
    "max_tickets": 150,
    "tickets_sold": 120,
    "rating": 4.6
  }))
  .unwrap();

  s.restore_event(event.clone()).await.unwrap();
  assert_eq!(s.get_event(7).await.unwrap(), Some(event.clone()));

  // Restoring again replaces instead of failing on the primary key.
  let mut updated = event;
  updated.tickets_sold = 130;
  s.restore_event(updated.clone()).await.unwrap();
  assert_eq!(s.get_event(7).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn inactive_events_are_not_listed() {
  let s = store().await;
  let created = s.create_event(submission("Cancelado", "Recife")).await.unwrap();
  let mut inactive = created.clone();
  inactive.is_active = false;
  s.restore_event(inactive).await.unwrap();

  assert!(s.list_events(CatalogQuery::default()).await.unwrap().is_empty());
  assert!(s.get_event(created.id).await.unwrap().is_some());
}

#[tokio::test]
async fn huge_page_sizes_do_not_wrap_to_unlimited() {
  let s = store().await;
  s.create_event(submission("Um", "São Paulo")).await.unwrap();
  s.create_event(submission("Dois", "São Paulo")).await.unwrap();

  let all = s
    .list_events(CatalogQuery {
      limit: Some(usize::MAX),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  let past_the_end = s
    .list_events(CatalogQuery {
      offset: Some(usize::MAX),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(past_the_end.is_empty());
}

#[tokio::test]
async fn update_keeps_sales_and_rejects_invalid_input() {
  let s = store().await;
  let created = s.create_event(submission("Festival", "São Paulo")).await.unwrap();
  s.issue_tickets(order(created.id, 2)).await.unwrap().unwrap();

  let mut edit = submission("Festival 2024", "Campinas");
  edit.price = 60.0;
  let updated = s.update_event(created.id, edit).await.unwrap().unwrap();
  assert_eq!(updated.title, "Festival 2024");
  assert_eq!(updated.city, "Campinas");
  assert_eq!(updated.price, 60.0);
  assert_eq!(updated.tickets_sold, 2);
  assert!(updated.is_active);

  let mut bad = submission("Festival", "São Paulo");
  bad.title = " ".into();
  assert!(matches!(
    s.update_event(created.id, bad).await,
    Err(Error::Core(_))
  ));

  assert!(s.update_event(999, submission("X", "Y")).await.unwrap().is_none());
}

#[tokio::test]
async fn deactivated_events_leave_listings_but_stay_addressable() {
  let s = store().await;
  let created = s.create_event(submission("Cancelado", "Recife")).await.unwrap();

  assert!(s.deactivate_event(created.id).await.unwrap());
  assert!(s.list_events(CatalogQuery::default()).await.unwrap().is_empty());
  assert!(!s.get_event(created.id).await.unwrap().unwrap().is_active);

  assert!(!s.deactivate_event(999).await.unwrap());
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

fn order(event_id: i64, quantity: u32) -> TicketOrder {
  TicketOrder {
    event_id,
    quantity,
    buyer: Some("ana@example.com".into()),
  }
}

async fn restored(s: &SqliteStore, json: serde_json::Value) -> InternalEvent {
  let event: InternalEvent = serde_json::from_value(json).unwrap();
  s.restore_event(event.clone()).await.unwrap();
  event
}

#[tokio::test]
async fn issuing_numbers_tickets_and_counts_sales() {
  let s = store().await;
  restored(
    &s,
    serde_json::json!({
      "id": 7,
      "title": "Festival",
      "price": 50.0,
      "max_tickets": 500,
      "tickets_sold": 450
    }),
  )
  .await;

  let tickets = s.issue_tickets(order(7, 2)).await.unwrap().unwrap();
  let numbers: Vec<_> = tickets.iter().map(|t| t.ticket_number.as_str()).collect();
  assert_eq!(numbers, ["TM00070451", "TM00070452"]);
  assert!(tickets.iter().all(|t| t.price_paid == 50.0));
  assert_ne!(tickets[0].qr_code, tickets[1].qr_code);

  assert_eq!(s.get_event(7).await.unwrap().unwrap().tickets_sold, 452);

  let fetched = s.get_ticket(tickets[1].id).await.unwrap().unwrap();
  assert_eq!(fetched, tickets[1]);
  assert!(s.get_ticket(999).await.unwrap().is_none());
}

#[tokio::test]
async fn refused_sales_leave_the_store_untouched() {
  let s = store().await;
  restored(
    &s,
    serde_json::json!({
      "id": 1, "title": "Lotado", "price": 10.0,
      "max_tickets": 100, "tickets_sold": 99
    }),
  )
  .await;
  restored(
    &s,
    serde_json::json!({
      "id": 2, "title": "Inativo", "price": 10.0,
      "max_tickets": 100, "is_active": false
    }),
  )
  .await;
  restored(
    &s,
    serde_json::json!({
      "id": 3, "title": "Encerrado", "price": 10.0,
      "max_tickets": 100, "sales_end_date": "2020-01-01T00:00:00"
    }),
  )
  .await;

  assert_eq!(
    s.issue_tickets(order(1, 2)).await.unwrap(),
    Err(SaleRejection::SoldOut)
  );
  assert_eq!(
    s.issue_tickets(order(2, 1)).await.unwrap(),
    Err(SaleRejection::Inactive)
  );
  assert_eq!(
    s.issue_tickets(order(3, 1)).await.unwrap(),
    Err(SaleRejection::SalesClosed)
  );
  assert_eq!(
    s.issue_tickets(order(404, 1)).await.unwrap(),
    Err(SaleRejection::EventNotFound)
  );
  assert_eq!(s.get_event(1).await.unwrap().unwrap().tickets_sold, 99);

  // The last seat still sells.
  assert_eq!(s.issue_tickets(order(1, 1)).await.unwrap().unwrap().len(), 1);
}

#[tokio::test]
async fn re_importing_a_seed_never_rolls_back_sales() {
  let s = store().await;
  let seed = serde_json::json!({
    "id": 7, "title": "Festival", "price": 50.0,
    "max_tickets": 500, "tickets_sold": 450
  });
  restored(&s, seed.clone()).await;
  s.issue_tickets(order(7, 1)).await.unwrap().unwrap();

  restored(&s, seed).await;
  assert_eq!(s.get_event(7).await.unwrap().unwrap().tickets_sold, 451);

  let next = s.issue_tickets(order(7, 1)).await.unwrap().unwrap();
  assert_eq!(next[0].ticket_number, "TM00070452");
}

// ─── Aggregated events ───────────────────────────────────────────────────────

#[tokio::test]
async fn aggregated_lookup_by_uuid_or_slug() {
  let s = store().await;
  let event = aggregated("metal-fest", Some("2024-05-10T18:00:00"), "São Paulo");
  s.add_aggregated(event.clone()).await.unwrap();

  let by_slug = s.get_aggregated("metal-fest".into()).await.unwrap();
  assert_eq!(by_slug.as_ref(), Some(&event));

  let upper = event.id.to_string().to_uppercase();
  let by_id = s.get_aggregated(upper).await.unwrap();
  assert_eq!(by_id.as_ref(), Some(&event));

  assert!(s.get_aggregated("outro".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn aggregated_lookup_by_numeric_id() {
  let s = store().await;
  let mut event = AggregatedEvent::new(AggregatedId::Numeric(5));
  event.titulo = Some("SHOW".into());
  event.legacy.title = Some("Show".into());
  s.add_aggregated(event.clone()).await.unwrap();

  assert_eq!(s.get_aggregated("5".into()).await.unwrap(), Some(event));
}

#[tokio::test]
async fn aggregated_records_round_trip_legacy_fields() {
  let s = store().await;
  let mut event = aggregated("misto", None, "Curitiba");
  event.legacy.price = Some(35.0);
  event.legacy.image = Some("https://example.com/x.jpg".into());
  s.add_aggregated(event.clone()).await.unwrap();

  let fetched = s.get_aggregated("misto".into()).await.unwrap().unwrap();
  assert_eq!(fetched.legacy, event.legacy);
}

#[tokio::test]
async fn aggregated_listing_orders_by_date_with_undated_last() {
  let s = store().await;
  s.add_aggregated(aggregated("sem-data", None, "São Paulo")).await.unwrap();
  s.add_aggregated(aggregated("maio", Some("2024-05-10T18:00:00"), "São Paulo"))
    .await
    .unwrap();
  s.add_aggregated(aggregated("abril", Some("2024-04-01"), "Curitiba"))
    .await
    .unwrap();

  let all = s.list_aggregated(CatalogQuery::default(), None).await.unwrap();
  assert_eq!(slugs(&all), ["abril", "maio", "sem-data"]);

  let curitiba = s
    .list_aggregated(
      CatalogQuery {
        city: Some("Curitiba".into()),
        ..Default::default()
      },
      None,
    )
    .await
    .unwrap();
  assert_eq!(slugs(&curitiba), ["abril"]);
}

#[tokio::test]
async fn upcoming_feed_drops_past_and_undated_events() {
  let s = store().await;
  s.add_aggregated(aggregated("passado", Some("2024-01-10T21:00:00"), "SP"))
    .await
    .unwrap();
  s.add_aggregated(aggregated("futuro", Some("2024-06-01T21:00:00"), "SP"))
    .await
    .unwrap();
  s.add_aggregated(aggregated("sem-data", None, "SP")).await.unwrap();

  let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
  let upcoming = s
    .list_aggregated(CatalogQuery::default(), Some(now))
    .await
    .unwrap();
  assert_eq!(slugs(&upcoming), ["futuro"]);
}

#[tokio::test]
async fn re_adding_an_aggregated_event_replaces_it() {
  let s = store().await;
  let mut event = aggregated("show", Some("2024-05-10"), "SP");
  s.add_aggregated(event.clone()).await.unwrap();
  event.titulo = Some("SHOW EXTRA".into());
  s.add_aggregated(event.clone()).await.unwrap();

  let all = s.list_aggregated(CatalogQuery::default(), None).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].titulo.as_deref(), Some("SHOW EXTRA"));
}
