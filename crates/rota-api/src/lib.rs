//! JSON REST API for the Rota duty engine.
//!
//! Exposes an axum [`Router`] backed by any [`rota_core::store::DutyStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rota_api::api_router(store.clone()))
//! ```

pub mod assign;
pub mod error;
pub mod pool;
pub mod schedule;
pub mod statistics;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
use rota_core::store::DutyStore;

pub use error::ApiError;

/// Largest page any listing endpoint will return.
pub const MAX_PAGE: usize = 1000;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: DutyStore + 'static,
{
  Router::new()
    // Pool
    .route("/sectors/{sector_id}/pool", get(pool::list::<S>).post(pool::add::<S>))
    .route("/sectors/{sector_id}/pool/{user_id}", delete(pool::remove::<S>))
    .route("/users/{user_id}/pool", get(pool::for_user::<S>))
    // Engine
    .route("/sectors/{sector_id}/assign", post(assign::automatic::<S>))
    .route("/sectors/{sector_id}/assign/manual", post(assign::manual::<S>))
    .route("/sectors/{sector_id}/plan-year", post(assign::plan_year::<S>))
    .route("/sectors/{sector_id}/availability", get(assign::availability::<S>))
    // Reporting
    .route("/sectors/{sector_id}/statistics/summary", get(statistics::summary::<S>))
    .route("/statistics", get(statistics::list::<S>))
    .route("/statistics/chart", get(statistics::chart::<S>))
    .route("/schedule", get(schedule::list::<S>))
    .route("/schedule/today", get(schedule::on_day::<S>))
    .route("/schedule/week", get(schedule::week::<S>))
    .route("/schedule/month", get(schedule::month::<S>))
    .route("/schedule/year", get(schedule::year::<S>))
    .with_state(store)
}

/// Current UTC date, the default reference for every view.
pub(crate) fn today() -> NaiveDate { Utc::now().date_naive() }

/// Validate an optional `limit` query parameter, defaulting to 100.
pub(crate) fn page_limit(limit: Option<usize>) -> Result<usize, ApiError> {
  match limit {
    None => Ok(100),
    Some(n) if (1..=MAX_PAGE).contains(&n) => Ok(n),
    Some(n) => Err(ApiError::BadRequest(format!(
      "limit must be within 1-{MAX_PAGE}, got {n}"
    ))),
  }
}

/// Validate an optional `offset` query parameter, defaulting to 0.
pub(crate) fn page_offset(offset: Option<usize>) -> Result<usize, ApiError> {
  match offset {
    None => Ok(0),
    Some(n) if i64::try_from(n).is_ok() => Ok(n),
    Some(n) => Err(ApiError::BadRequest(format!(
      "offset must be at most {}, got {n}",
      i64::MAX
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use rota_core::directory::DutyUser;
  use rota_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.upsert_sector(1, "Front desk").await.unwrap();
    for (user_id, name, eligible) in [(1, "Ada", true), (2, "Brook", true), (3, "Cyd", false)] {
      store
        .upsert_user(DutyUser {
          user_id,
          display_name: Some(name.to_string()),
          is_duty_eligible: eligible,
        })
        .await
        .unwrap();
    }
    Arc::new(store)
  }

  async fn call(
    store:  &Arc<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(store.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn pool(store: &Arc<SqliteStore>, users: &[i64]) {
    for user_id in users {
      let (status, _) =
        call(store, "POST", "/sectors/1/pool", Some(json!({ "user_id": user_id }))).await;
      assert_eq!(status, StatusCode::CREATED);
    }
  }

  // ── Pool ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn pool_add_list_remove() {
    let store = make_store().await;
    pool(&store, &[1, 2]).await;

    let (status, page) = call(&store, "GET", "/sectors/1/pool", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert!(page["items"][0]["user_name"].is_string());

    let (status, entry) = call(&store, "DELETE", "/sectors/1/pool/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["is_active"], false);

    let (status, err) = call(&store, "DELETE", "/sectors/1/pool/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "pool_entry_not_found");

    let (_, entries) = call(&store, "GET", "/users/2/pool", None).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn ineligible_user_is_unprocessable() {
    let store = make_store().await;
    let (status, err) =
      call(&store, "POST", "/sectors/1/pool", Some(json!({ "user_id": 3 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "user_not_eligible");
    assert!(err["error"].as_str().unwrap().contains('3'));
  }

  #[tokio::test]
  async fn unknown_sector_is_404() {
    let store = make_store().await;
    let (status, err) = call(&store, "GET", "/sectors/9/pool", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "sector_not_found");
  }

  #[tokio::test]
  async fn oversized_page_is_rejected() {
    let store = make_store().await;
    let (status, err) = call(&store, "GET", "/schedule?limit=5000", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "bad_request");
  }

  #[tokio::test]
  async fn offset_beyond_sql_range_is_rejected() {
    let store = make_store().await;
    pool(&store, &[1]).await;
    for uri in [
      "/schedule?offset=18446744073709551615",
      "/statistics?offset=9223372036854775808",
      "/sectors/1/pool?offset=18446744073709551615",
    ] {
      let (status, err) = call(&store, "GET", uri, None).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
      assert_eq!(err["kind"], "bad_request");
    }

    let (status, page) =
      call(&store, "GET", "/schedule?offset=9223372036854775807", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["items"].as_array().unwrap().is_empty());
  }

  // ── Engine ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn assign_without_pool_is_unprocessable() {
    let store = make_store().await;
    let (status, err) = call(
      &store,
      "POST",
      "/sectors/1/assign",
      Some(json!({ "start": "2026-03-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "no_active_pool");
  }

  #[tokio::test]
  async fn assign_week_then_conflict() {
    let store = make_store().await;
    pool(&store, &[1, 2]).await;

    let (status, outcome) = call(
      &store,
      "POST",
      "/sectors/1/assign",
      Some(json!({ "kind": "week", "start": "2026-03-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["period"]["dates"].as_array().unwrap().len(), 7);
    assert_eq!(outcome["selection"], "unfiltered");

    let (status, err) = call(
      &store,
      "POST",
      "/sectors/1/assign/manual",
      Some(json!({ "user_id": 1, "kind": "day", "start": "2026-03-04" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "conflict_exists");

    let (status, outcome) = call(
      &store,
      "POST",
      "/sectors/1/assign/manual",
      Some(json!({ "user_id": 1, "kind": "day", "start": "2026-03-04", "force": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["overwritten"].as_array().unwrap().len(), 1);

    let (_, today) =
      call(&store, "GET", "/schedule/today?sector_id=1&date=2026-03-04", None).await;
    assert_eq!(today[0]["user_id"], 1);
    assert_eq!(today[0]["sector_name"], "Front desk");
  }

  #[tokio::test]
  async fn invalid_period_is_bad_request() {
    let store = make_store().await;
    pool(&store, &[1]).await;
    let (status, err) = call(
      &store,
      "POST",
      "/sectors/1/assign",
      Some(json!({ "kind": "day", "start": "2026-03-07", "working_days_only": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "invalid_period");
  }

  #[tokio::test]
  async fn plan_year_defaults_to_working_days() {
    let store = make_store().await;
    pool(&store, &[1, 2]).await;

    let (status, plan) =
      call(&store, "POST", "/sectors/1/plan-year", Some(json!({ "year": 2026 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["working_days_only"], true);
    assert_eq!(plan["days"].as_array().unwrap().len(), 261);

    let (status, members) = call(
      &store,
      "GET",
      "/sectors/1/availability?start=2026-03-02&end=2026-03-06",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let booked: u64 = members
      .as_array()
      .unwrap()
      .iter()
      .map(|m| m["booked_count"].as_u64().unwrap())
      .sum();
    assert_eq!(booked, 5);

    let (_, summary) =
      call(&store, "GET", "/sectors/1/statistics/summary?year=2026", None).await;
    let total: i64 = summary
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["total_duties"].as_i64().unwrap())
      .sum();
    assert_eq!(total, 261);

    let (_, stats) = call(&store, "GET", "/statistics?year=2026&sector_id=1", None).await;
    assert_eq!(stats["total"], 2);
  }

  // ── Views ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn calendar_views() {
    let store = make_store().await;
    pool(&store, &[1]).await;
    call(
      &store,
      "POST",
      "/sectors/1/assign",
      Some(json!({ "kind": "week", "start": "2026-03-02" })),
    )
    .await;

    let (status, week) =
      call(&store, "GET", "/schedule/week?today=2026-03-04", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["start"], "2026-03-02");
    assert_eq!(week["days"][2]["is_today"], true);
    assert_eq!(week["days"][2]["duties"].as_array().unwrap().len(), 1);

    let (status, month) =
      call(&store, "GET", "/schedule/month?year=2026&month=3&sector_id=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(month["first_day"], "2026-03-01");

    let (status, err) = call(&store, "GET", "/schedule/month?year=2026&month=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "invalid_period");

    let (_, year) = call(&store, "GET", "/schedule/year?year=2026", None).await;
    assert_eq!(year["total_duties"], 7);
    assert_eq!(year["top_holders"][0]["user_name"], "Ada");

    let (_, listing) = call(&store, "GET", "/schedule?user_id=1&limit=3", None).await;
    assert_eq!(listing["total"], 7);
    assert_eq!(listing["items"].as_array().unwrap().len(), 3);
    assert_eq!(listing["items"][0]["duty_date"], "2026-03-08");
  }

  #[tokio::test]
  async fn statistics_chart() {
    let store = make_store().await;
    pool(&store, &[1, 2]).await;
    for (user_id, start) in [(1, "2026-03-02"), (2, "2026-03-09")] {
      let (status, _) = call(
        &store,
        "POST",
        "/sectors/1/assign/manual",
        Some(json!({ "user_id": user_id, "kind": "day", "start": start })),
      )
      .await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (status, chart) = call(&store, "GET", "/statistics/chart?year=2026", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chart["year"], 2026);
    assert_eq!(chart["total"], 2);
    assert_eq!(chart["monthly"]["labels"].as_array().unwrap().len(), 12);
    assert_eq!(chart["monthly"]["data"][2], 2);
    assert_eq!(chart["weekly"]["labels"][0], "Mon");
    assert_eq!(chart["weekly"]["data"][0], 2);

    let (_, ada) =
      call(&store, "GET", "/statistics/chart?year=2026&sector_id=1&user_id=1", None).await;
    assert_eq!(ada["total"], 1);

    let (status, other) = call(&store, "GET", "/statistics/chart?year=2020", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(other["total"], 0);
    assert_eq!(other["weekly"]["data"].as_array().unwrap().len(), 7);
  }
}
