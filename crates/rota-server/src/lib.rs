//! Wiring for the `rota-server` binary: directory seeding and the HTTP app.

pub mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use axum::Router;
use rota_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Upsert the configured sectors and users into the store's directory.
pub async fn seed_directory(
  store: &SqliteStore,
  config: &ServerConfig,
) -> rota_store_sqlite::Result<()> {
  for sector in &config.sectors {
    store.upsert_sector(sector.sector_id, sector.name.clone()).await?;
  }
  for user in &config.users {
    store.upsert_user(user.clone().into()).await?;
  }
  info!(
    sectors = config.sectors.len(),
    users = config.users.len(),
    "seeded directory"
  );
  Ok(())
}

/// The JSON API mounted under `/api`, with request tracing.
pub fn app(store: Arc<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", rota_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use crate::config::{SectorSeed, UserSeed};

  fn config() -> ServerConfig {
    ServerConfig {
      host:       "127.0.0.1".to_string(),
      port:       0,
      store_path: ":memory:".into(),
      sectors:    vec![SectorSeed { sector_id: 1, name: "Front desk".to_string() }],
      users:      vec![
        UserSeed { user_id: 1, display_name: Some("Ada".to_string()), is_duty_eligible: true },
        UserSeed { user_id: 2, display_name: None, is_duty_eligible: true },
      ],
    }
  }

  #[tokio::test]
  async fn seeding_is_repeatable() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed_directory(&store, &config()).await.unwrap();
    seed_directory(&store, &config()).await.unwrap();
    assert_eq!(store.sectors().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed_directory(&store, &config()).await.unwrap();
    let app = app(Arc::new(store));

    let req = Request::builder()
      .method("POST")
      .uri("/api/sectors/1/pool")
      .header("content-type", "application/json")
      .body(Body::from(r#"{"user_id":2}"#))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = Request::builder()
      .uri("/api/sectors/1/pool")
      .body(Body::empty())
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let page: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(page["items"][0]["user_name"], "User 2");

    let req = Request::builder().uri("/sectors/1/pool").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
