//! Handlers for `/schedule` endpoints.
//!
//! Every view accepts an optional `sector_id`; without it all sectors are
//! shown. `today` can be passed to pin the reference date.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{Datelike, NaiveDate};
use rota_core::{
  SectorId, UserId,
  assignment::DutyEntry,
  period::week_anchor,
  pool::Page,
  report::{MonthCalendar, WeekView, YearOverview},
  store::{DutyStore, ScheduleQuery},
};
use serde::Deserialize;

use crate::{error::ApiError, page_limit, page_offset, today};

// ─── Listing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  pub from:      Option<NaiveDate>,
  pub to:        Option<NaiveDate>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /schedule[?sector_id=...][&user_id=...][&from=...][&to=...]`
///
/// Newest duty dates first.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<DutyEntry>>, ApiError>
where
  S: DutyStore,
{
  let query = ScheduleQuery {
    sector_id: params.sector_id,
    user_id:   params.user_id,
    from:      params.from,
    to:        params.to,
    limit:     page_limit(params.limit)?,
    offset:    page_offset(params.offset)?,
  };
  let page = store.list_schedule(&query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Views ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ViewParams {
  pub sector_id: Option<SectorId>,
  pub today:     Option<NaiveDate>,
  /// `today`: the day to show. `week`: the first day, default this Monday.
  pub date:      Option<NaiveDate>,
  pub year:      Option<i32>,
  pub month:     Option<u32>,
}

impl ViewParams {
  fn today(&self) -> NaiveDate { self.today.unwrap_or_else(today) }
}

/// `GET /schedule/today[?date=...]`
pub async fn on_day<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ViewParams>,
) -> Result<Json<Vec<DutyEntry>>, ApiError>
where
  S: DutyStore,
{
  let date = params.date.unwrap_or_else(|| params.today());
  let duties = store
    .duties_on(date, params.sector_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(duties))
}

/// `GET /schedule/week[?date=...]`
pub async fn week<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ViewParams>,
) -> Result<Json<WeekView>, ApiError>
where
  S: DutyStore,
{
  let today = params.today();
  let start = match params.date {
    Some(date) => date,
    None => week_anchor(today)?,
  };
  let view = store
    .week_view(params.sector_id, start, today)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(view))
}

/// `GET /schedule/month[?year=...][&month=...]`
pub async fn month<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ViewParams>,
) -> Result<Json<MonthCalendar>, ApiError>
where
  S: DutyStore,
{
  let today = params.today();
  let calendar = store
    .month_calendar(
      params.sector_id,
      params.year.unwrap_or(today.year()),
      params.month.unwrap_or(today.month()),
      today,
    )
    .await
    .map_err(ApiError::store)?;
  Ok(Json(calendar))
}

/// `GET /schedule/year[?year=...]`
pub async fn year<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ViewParams>,
) -> Result<Json<YearOverview>, ApiError>
where
  S: DutyStore,
{
  let year = params.year.unwrap_or_else(|| params.today().year());
  let overview = store
    .year_overview(params.sector_id, year)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(overview))
}
