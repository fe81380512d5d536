//! Handlers for the assignment engine.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sectors/{sector_id}/assign` | Automatic; `start` defaults to next Monday |
//! | `POST` | `/sectors/{sector_id}/assign/manual` | Body needs `user_id`; `force` overwrites |
//! | `POST` | `/sectors/{sector_id}/plan-year` | `working_days_only` defaults to `true` |
//! | `GET`  | `/sectors/{sector_id}/availability` | `?start=YYYY-MM-DD&end=YYYY-MM-DD` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Datelike, NaiveDate};
use rota_core::{
  SectorId, UserId,
  assignment::{Availability, ManualAssignment, PeriodAssignment, YearPlanRequest},
  period::{PeriodKind, next_monday},
  store::DutyStore,
};
use serde::Deserialize;

use crate::{error::ApiError, today};

fn default_kind() -> PeriodKind { PeriodKind::Week }

fn default_true() -> bool { true }

// ─── Automatic ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  #[serde(default = "default_kind")]
  pub kind:              PeriodKind,
  pub start:             Option<NaiveDate>,
  pub created_by:        Option<UserId>,
  #[serde(default)]
  pub allow_same_holder: bool,
  #[serde(default)]
  pub working_days_only: bool,
}

/// `POST /sectors/{sector_id}/assign`
pub async fn automatic<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DutyStore,
{
  let request = PeriodAssignment {
    sector_id,
    kind: body.kind,
    start: match body.start {
      Some(start) => start,
      None => next_monday(today())?,
    },
    created_by: body.created_by,
    allow_same_holder: body.allow_same_holder,
    working_days_only: body.working_days_only,
  };
  let outcome = store.assign_period(request).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Manual ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ManualBody {
  pub user_id:           UserId,
  #[serde(default = "default_kind")]
  pub kind:              PeriodKind,
  pub start:             Option<NaiveDate>,
  pub created_by:        Option<UserId>,
  #[serde(default)]
  pub force:             bool,
  #[serde(default)]
  pub working_days_only: bool,
}

/// `POST /sectors/{sector_id}/assign/manual`
pub async fn manual<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Json(body): Json<ManualBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DutyStore,
{
  let request = ManualAssignment {
    sector_id,
    kind: body.kind,
    start: match body.start {
      Some(start) => start,
      None => next_monday(today())?,
    },
    user_id: body.user_id,
    created_by: body.created_by,
    force: body.force,
    working_days_only: body.working_days_only,
  };
  let outcome = store.assign_manual(request).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── Year plan ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlanBody {
  pub year:              Option<i32>,
  #[serde(default = "default_true")]
  pub working_days_only: bool,
}

/// `POST /sectors/{sector_id}/plan-year`, body `{"year":2026}`
pub async fn plan_year<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Json(body): Json<PlanBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DutyStore,
{
  let request = YearPlanRequest {
    sector_id,
    year: body.year.unwrap_or_else(|| today().year()),
    working_days_only: body.working_days_only,
  };
  let plan = store.plan_year(request).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(plan)))
}

// ─── Availability ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

/// `GET /sectors/{sector_id}/availability?start=...&end=...`
pub async fn availability<S>(
  State(store): State<Arc<S>>,
  Path(sector_id): Path<SectorId>,
  Query(params): Query<AvailabilityParams>,
) -> Result<Json<Vec<Availability>>, ApiError>
where
  S: DutyStore,
{
  let members = store
    .check_availability(sector_id, params.start, params.end)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(members))
}
