//! The `DutyStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `rota-store-sqlite`).
//! Higher layers (`rota-api`, `rota-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  SectorId, UserId,
  assignment::{
    AssignmentOutcome, Availability, DutyEntry, ManualAssignment,
    PeriodAssignment, Statistics, YearPlan, YearPlanRequest,
  },
  pool::{NewPoolEntry, Page, PoolEntry, PoolMember, PoolQuery},
  report::{Distribution, MonthCalendar, SummaryRow, WeekView, YearOverview},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`DutyStore::list_schedule`].
#[derive(Debug, Clone)]
pub struct ScheduleQuery {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  /// Inclusive lower bound on `duty_date`.
  pub from:      Option<NaiveDate>,
  /// Inclusive upper bound on `duty_date`.
  pub to:        Option<NaiveDate>,
  pub limit:     usize,
  pub offset:    usize,
}

impl Default for ScheduleQuery {
  fn default() -> Self {
    Self { sector_id: None, user_id: None, from: None, to: None, limit: 100, offset: 0 }
  }
}

/// Parameters for [`DutyStore::list_statistics`].
#[derive(Debug, Clone)]
pub struct StatisticsQuery {
  pub sector_id: Option<SectorId>,
  pub user_id:   Option<UserId>,
  pub year:      Option<i32>,
  pub limit:     usize,
  pub offset:    usize,
}

impl Default for StatisticsQuery {
  fn default() -> Self {
    Self { sector_id: None, user_id: None, year: None, limit: 100, offset: 0 }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a duty-rotation backend.
///
/// Every write operation is atomic: it either applies all of its assignment
/// and statistics changes or none of them. Backend errors convert into
/// [`crate::Error`] so callers can match on the domain failure kinds.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DutyStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Pool ──────────────────────────────────────────────────────────────

  /// Add a user to a sector's pool, reactivating a previous entry if any.
  fn add_to_pool(
    &self,
    entry: NewPoolEntry,
  ) -> impl Future<Output = Result<PoolEntry, Self::Error>> + Send + '_;

  /// Deactivate a user's pool entry. Returns the deactivated entry.
  fn remove_from_pool(
    &self,
    user_id: UserId,
    sector_id: SectorId,
  ) -> impl Future<Output = Result<PoolEntry, Self::Error>> + Send + '_;

  /// Page through a sector's pool, newest entries first.
  fn list_pool(
    &self,
    sector_id: SectorId,
    query: PoolQuery,
  ) -> impl Future<Output = Result<Page<PoolMember>, Self::Error>> + Send + '_;

  /// Every pool entry of one user, across sectors.
  fn user_pool_entries(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<PoolEntry>, Self::Error>> + Send + '_;

  // ── Assignment engine ─────────────────────────────────────────────────

  /// Pick the least-loaded pool member and assign them the whole period.
  ///
  /// Fails on an empty pool or if any date of the period is already taken.
  fn assign_period(
    &self,
    request: PeriodAssignment,
  ) -> impl Future<Output = Result<AssignmentOutcome, Self::Error>> + Send + '_;

  /// Assign a specific user. With `force`, existing assignments on the
  /// period's dates are replaced and their holders' statistics debited.
  fn assign_manual(
    &self,
    request: ManualAssignment,
  ) -> impl Future<Output = Result<AssignmentOutcome, Self::Error>> + Send + '_;

  /// Wipe a sector's year and redistribute it round-robin.
  fn plan_year(
    &self,
    request: YearPlanRequest,
  ) -> impl Future<Output = Result<YearPlan, Self::Error>> + Send + '_;

  // ── Availability ──────────────────────────────────────────────────────

  /// Bookings of every active pool member within `[start, end]`.
  fn check_availability(
    &self,
    sector_id: SectorId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Availability>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Who holds duty on `date`.
  fn duties_on(
    &self,
    date: NaiveDate,
    sector_id: Option<SectorId>,
  ) -> impl Future<Output = Result<Vec<DutyEntry>, Self::Error>> + Send + '_;

  fn week_view(
    &self,
    sector_id: Option<SectorId>,
    start: NaiveDate,
    today: NaiveDate,
  ) -> impl Future<Output = Result<WeekView, Self::Error>> + Send + '_;

  fn month_calendar(
    &self,
    sector_id: Option<SectorId>,
    year: i32,
    month: u32,
    today: NaiveDate,
  ) -> impl Future<Output = Result<MonthCalendar, Self::Error>> + Send + '_;

  fn year_overview(
    &self,
    sector_id: Option<SectorId>,
    year: i32,
  ) -> impl Future<Output = Result<YearOverview, Self::Error>> + Send + '_;

  /// Standing of every relevant user in a sector for `year`.
  fn statistics_summary(
    &self,
    sector_id: SectorId,
    year: i32,
  ) -> impl Future<Output = Result<Vec<SummaryRow>, Self::Error>> + Send + '_;

  /// Monthly and weekday counts of a year's duties, optionally narrowed to
  /// one sector and/or one user.
  fn distribution(
    &self,
    sector_id: Option<SectorId>,
    user_id: Option<UserId>,
    year: i32,
  ) -> impl Future<Output = Result<Distribution, Self::Error>> + Send + '_;

  fn list_schedule<'a>(
    &'a self,
    query: &'a ScheduleQuery,
  ) -> impl Future<Output = Result<Page<DutyEntry>, Self::Error>> + Send + 'a;

  fn list_statistics<'a>(
    &'a self,
    query: &'a StatisticsQuery,
  ) -> impl Future<Output = Result<Page<Statistics>, Self::Error>> + Send + 'a;
}
