//! Handlers for statistics endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Datelike;
use rota_core::{
  SectorId, UserId,
  assignment::Statistics,
  pool::Page,
  report::{Distribution, SummaryRow},
  store::{DutyStore, StatisticsQuery},
};
use serde::Deserialize;

use crate::{error::ApiError, page_limit, page_offset, today};

#[derive(Debug, Deserialize, Default)]
pub struct SummaryParams {
  pub year: Option<i32>,
}

/// `GET /sectors/{sector_id}/statistics/summary[?year=...]`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Query(params): Query<SummaryParams>,
) -> Result<Json<Vec<SummaryRow>>, ApiError>
where
  S: DutyStore,
{
  let year = params.year.unwrap_or_else(|| today().year());
  let rows = store
    .statistics_summary(sector_id, year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  pub year:      Option<i32>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /statistics[?sector_id=...][&user_id=...][&year=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Statistics>>, ApiError>
where
  S: DutyStore,
{
  let query = StatisticsQuery {
    sector_id: params.sector_id,
    user_id:   params.user_id,
    year:      params.year,
    limit:     page_limit(params.limit)?,
    offset:    page_offset(params.offset)?,
  };
  let page = store.list_statistics(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

#[derive(Debug, Deserialize, Default)]
pub struct ChartParams {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  pub year:      Option<i32>,
}

/// `GET /statistics/chart[?sector_id=...][&user_id=...][&year=...]`
///
/// Duty counts per month and per weekday, ready for plotting.
pub async fn chart<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ChartParams>,
) -> Result<Json<Distribution>, ApiError>
where
  S: DutyStore,
{
  let year = params.year.unwrap_or_else(|| today().year());
  let distribution = store
    .distribution(params.sector_id, params.user_id, year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(distribution))
}
