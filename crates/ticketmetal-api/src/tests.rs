//! Router tests over an in-memory SQLite catalog.

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use ticketmetal_core::RawEventRecord;
use ticketmetal_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::{ServerConfig, api_router, app, seed};

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

fn seed_records() -> Vec<RawEventRecord> {
  serde_json::from_value(json!([
    {
      "id": 1,
      "title": "Festival de Música 2024",
      "date": "2024-03-15T20:00:00",
      "city": "São Paulo",
      "price": 50.0,
      "max_tickets": 500,
      "tickets_sold": 450,
      "rating": 4.8
    },
    {
      "id": 2,
      "title": "Workshop de Tecnologia",
      "date": "2024-03-20T14:00:00",
      "city": "Rio de Janeiro",
      "price": 30.0,
      "max_tickets": 150,
      "tickets_sold": 120
    },
    {
      "id": "6f1c2b1e-7a55-4d39-9a3c-0d3f1f6b2a10",
      "slug": "metal-fest",
      "titulo": "METAL FEST",
      "data_formatada": "2099-05-10T18:00:00",
      "cidade": "São Paulo",
      "preco_min": 80.0,
      "link_compra": "https://www.sympla.com.br/metal-fest"
    },
    {
      "id": "0b8e3f5a-1d2c-4e6f-8a9b-7c6d5e4f3a21",
      "slug": "show-antigo",
      "titulo": "SHOW ANTIGO",
      "data_formatada": "2001-01-01T21:00:00"
    }
  ]))
  .unwrap()
}

async fn seeded() -> Router {
  let store = store().await;
  seed::import(store.as_ref(), seed_records()).await.unwrap();
  api_router(store)
}

async fn send(router: Router, req: Request<Body>) -> (StatusCode, Value) {
  let resp = router.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, body)
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> { json_request("POST", uri, body) }

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy() {
  let (status, body) = send(api_router(store().await), get("/health")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({ "status": "healthy" }));
}

// ─── Platform events ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_fetch_by_id() {
  let router = api_router(store().await);
  let (status, created) = send(
    router.clone(),
    post_json(
      "/events",
      json!({
        "title": "Feira de Vinil",
        "date": "2024-06-01T10:00:00",
        "city": "Belo Horizonte",
        "price": 0.0,
        "max_tickets": 80
      }),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = created["id"].as_i64().unwrap();
  assert_eq!(created["tickets_sold"], 0);

  let (status, fetched) = send(router, get(&format!("/events/{id}"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let record: RawEventRecord = serde_json::from_value(fetched).unwrap();
  assert!(matches!(record, RawEventRecord::Internal(_)));
}

#[tokio::test]
async fn create_rejects_invalid_price() {
  let (status, body) = send(
    api_router(store().await),
    post_json(
      "/events",
      json!({
        "title": "Evento",
        "date": "2024-06-01",
        "price": -5.0,
        "max_tickets": 10
      }),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn list_filters_by_city_and_pages() {
  let router = seeded().await;

  let (_, all) = send(router.clone(), get("/events")).await;
  assert_eq!(all.as_array().unwrap().len(), 2);

  let (_, rio) = send(router.clone(), get("/events?city=Rio%20de%20Janeiro")).await;
  assert_eq!(rio.as_array().unwrap().len(), 1);
  assert_eq!(rio[0]["id"], 2);

  let (_, page) = send(router, get("/events?limit=1&offset=1")).await;
  assert_eq!(page.as_array().unwrap().len(), 1);
  assert_eq!(page[0]["id"], 2);
}

#[tokio::test]
async fn unknown_keys_are_404_with_json_error() {
  let router = seeded().await;
  for uri in ["/events/999", "/events/nao-existe", "/events/999/stats"] {
    let (status, body) = send(router.clone(), get(uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert!(body["error"].is_string(), "{uri}");
  }
}

#[tokio::test]
async fn put_edits_a_platform_event() {
  let router = seeded().await;
  let (status, body) = send(
    router.clone(),
    json_request(
      "PUT",
      "/events/2",
      json!({
        "title": "Workshop de Rust",
        "date": "2024-03-21T14:00:00",
        "city": "Rio de Janeiro",
        "price": 40.0,
        "max_tickets": 150
      }),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["title"], "Workshop de Rust");
  assert_eq!(body["tickets_sold"], 120);

  let (_, fetched) = send(router.clone(), get("/events/2")).await;
  assert_eq!(fetched["price"], 40.0);

  let invalid = json!({ "title": "", "date": "2024-03-21", "price": 1.0, "max_tickets": 1 });
  let (status, _) = send(router.clone(), json_request("PUT", "/events/2", invalid)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let valid = json!({ "title": "X", "date": "2024-03-21", "price": 1.0, "max_tickets": 1 });
  let (status, _) = send(router, json_request("PUT", "/events/999", valid)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_withdraws_an_event_from_listings() {
  let router = seeded().await;
  let delete = |uri: &str| {
    Request::builder()
      .method("DELETE")
      .uri(uri)
      .body(Body::empty())
      .unwrap()
  };

  let (status, _) = send(router.clone(), delete("/events/2")).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, all) = send(router.clone(), get("/events")).await;
  assert_eq!(all.as_array().unwrap().len(), 1);

  let (status, fetched) = send(router.clone(), get("/events/2")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["is_active"], false);

  let (status, _) = send(router.clone(), delete("/events/999")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, body) = send(router, delete("/events/metal-fest")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn buying_tickets_updates_stats_and_reports() {
  let router = seeded().await;

  let (status, tickets) = send(
    router.clone(),
    post_json("/tickets", json!({ "event_id": 1, "quantity": 2 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(tickets[0]["ticket_number"], "TM00010451");
  assert_eq!(tickets[1]["ticket_number"], "TM00010452");
  assert_eq!(tickets[0]["price_paid"], 50.0);

  let id = tickets[1]["id"].as_i64().unwrap();
  let (status, ticket) = send(router.clone(), get(&format!("/tickets/{id}"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(ticket, tickets[1]);

  let (_, stats) = send(router.clone(), get("/events/1/stats")).await;
  assert_eq!(stats["tickets_available"], 48);

  let (_, summary) = send(router, get("/reports/summary")).await;
  assert_eq!(summary["total_tickets_sold"], 572);
}

#[tokio::test]
async fn refused_sales_explain_why() {
  let router = seeded().await;

  let (status, body) = send(
    router.clone(),
    post_json("/tickets", json!({ "event_id": 2, "quantity": 10 })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");

  for _ in 0..2 {
    send(
      router.clone(),
      post_json("/tickets", json!({ "event_id": 2, "quantity": 10 })),
    )
    .await;
  }
  let (status, body) = send(
    router.clone(),
    post_json("/tickets", json!({ "event_id": 2, "quantity": 1 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Ingressos esgotados");
  assert_eq!(body["reason"], "sold_out");

  let (status, body) = send(
    router.clone(),
    post_json("/tickets", json!({ "event_id": 999 })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Evento não encontrado");

  let delete = Request::builder()
    .method("DELETE")
    .uri("/events/1")
    .body(Body::empty())
    .unwrap();
  send(router.clone(), delete).await;
  let (status, body) = send(router, post_json("/tickets", json!({ "event_id": 1 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["reason"], "inactive");
}

#[tokio::test]
async fn unknown_tickets_are_404_with_json_error() {
  let router = seeded().await;
  for uri in ["/tickets/999", "/tickets/abc"] {
    let (status, body) = send(router.clone(), get(uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert!(body["error"].is_string(), "{uri}");
  }
}

// ─── Aggregated events ───────────────────────────────────────────────────────

#[tokio::test]
async fn rock_feed_only_lists_upcoming_events() {
  let (status, body) = send(seeded().await, get("/events/rock")).await;
  assert_eq!(status, StatusCode::OK);
  let slugs: Vec<_> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["slug"].as_str().unwrap())
    .collect();
  assert_eq!(slugs, ["metal-fest"]);
}

#[tokio::test]
async fn aggregated_events_resolve_by_slug_and_uuid() {
  let router = seeded().await;

  let (status, by_slug) = send(router.clone(), get("/events/metal-fest")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(by_slug["titulo"], "METAL FEST");

  let (status, by_id) = send(
    router,
    get("/events/6f1c2b1e-7a55-4d39-9a3c-0d3f1f6b2a10"),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(by_id, by_slug);

  let record: RawEventRecord = serde_json::from_value(by_id).unwrap();
  assert!(matches!(record, RawEventRecord::Aggregated(_)));
}

#[tokio::test]
async fn numeric_keys_fall_back_to_aggregated_records() {
  let store = store().await;
  let mixed: Vec<RawEventRecord> =
    serde_json::from_value(json!([{ "id": 5, "title": "Show", "titulo": "SHOW" }])).unwrap();
  seed::import(store.as_ref(), mixed).await.unwrap();

  let (status, body) = send(api_router(store), get("/events/5")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["titulo"], "SHOW");
}

// ─── Stats and reports ───────────────────────────────────────────────────────

#[tokio::test]
async fn stats_for_a_platform_event() {
  let (status, body) = send(seeded().await, get("/events/1/stats")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["tickets_available"], 50);
  assert_eq!(body["total_revenue"], 22_500.0);
  assert_eq!(body["occupancy_rate"], 90.0);
}

#[tokio::test]
async fn stats_of_a_non_numeric_key_is_a_json_400() {
  let (status, body) = send(seeded().await, get("/events/metal-fest/stats")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("metal-fest"));
}

#[tokio::test]
async fn summary_totals_every_platform_event() {
  let (status, body) = send(seeded().await, get("/reports/summary")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_events"], 2);
  assert_eq!(body["total_tickets_sold"], 570);
  assert_eq!(body["total_revenue"], 26_100.0);
  assert_eq!(body["events"].as_array().unwrap().len(), 2);
}

// ─── Application ─────────────────────────────────────────────────────────────

fn config(cors_permissive: bool) -> ServerConfig {
  ServerConfig {
    host: "127.0.0.1".into(),
    port: 8000,
    store_path: PathBuf::from(":memory:"),
    seed_path: None,
    cors_permissive,
  }
}

#[tokio::test]
async fn app_nests_the_api_and_applies_cors() {
  let req = || {
    Request::builder()
      .uri("/api/health")
      .header(header::ORIGIN, "http://localhost:5173")
      .body(Body::empty())
      .unwrap()
  };

  let resp = app(store().await, &config(true)).oneshot(req()).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
    "*"
  );

  let resp = app(store().await, &config(false)).oneshot(req()).await.unwrap();
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn seed_import_counts_each_schema() {
  let store = store().await;
  let report = seed::import(store.as_ref(), seed_records()).await.unwrap();
  assert_eq!(report.internal, 2);
  assert_eq!(report.aggregated, 2);
}
