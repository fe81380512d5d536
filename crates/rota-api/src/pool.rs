//! Handlers for pool membership endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/sectors/{sector_id}/pool` | Body: `{"user_id":7,"added_by":1}` |
//! | `GET`    | `/sectors/{sector_id}/pool` | Optional `?active_only`, `limit`, `offset` |
//! | `DELETE` | `/sectors/{sector_id}/pool/{user_id}` | Soft removal |
//! | `GET`    | `/users/{user_id}/pool` | Every sector the user was ever pooled in |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rota_core::{
  SectorId, UserId,
  pool::{NewPoolEntry, Page, PoolEntry, PoolMember, PoolQuery},
  store::DutyStore,
};
use serde::Deserialize;

use crate::{error::ApiError, page_limit, page_offset};

// ─── Add ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddBody {
  pub user_id:  UserId,
  pub added_by: Option<UserId>,
}

/// `POST /sectors/{sector_id}/pool`
pub async fn add<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Json(body): Json<AddBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DutyStore,
{
  let entry = store
    .add_to_pool(NewPoolEntry { user_id: body.user_id, sector_id, added_by: body.added_by })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub active_only: Option<bool>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// `GET /sectors/{sector_id}/pool[?active_only=false][&limit=...][&offset=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<PoolMember>>, ApiError>
where
  S: DutyStore,
{
  let query = PoolQuery {
    active_only: params.active_only.unwrap_or(true),
    limit:       page_limit(params.limit)?,
    offset:      page_offset(params.offset)?,
  };
  let page = store.list_pool(sector_id, query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /sectors/{sector_id}/pool/{user_id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path((sector_id, user_id)): Path<(SectorId, UserId)>,
) -> Result<Json<PoolEntry>, ApiError>
where
  S: DutyStore,
{
  let entry = store
    .remove_from_pool(user_id, sector_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entry))
}

// ─── Per user ─────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}/pool`
pub async fn for_user<S>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<UserId>,
) -> Result<Json<Vec<PoolEntry>>, ApiError>
where
  S: DutyStore,
{
  let entries = store.user_pool_entries(user_id).await.map_err(ApiError::store)?;
  Ok(Json(entries))
}
